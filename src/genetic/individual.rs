use log::debug;

use crate::types::{Gene, LessonSlot, School, Timetable};

/// Stable identity of an individual: its genes in sorted order. Gene order
/// carries no meaning, so two individuals with the same multiset share a
/// key. Used for score caching, diversity, and hall-of-fame deduplication.
pub type IndividualKey = Vec<Gene>;

/// A candidate timetable: a fixed-length vector of genes, one position per
/// required weekly lesson across all classes. Unfilled positions hold
/// `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    genes: Vec<Gene>,
}

impl Individual {
    pub fn new(genes: Vec<Gene>) -> Self {
        Self { genes }
    }

    /// An individual with every position unassigned
    pub fn blank(len: usize) -> Self {
        Self {
            genes: vec![None; len],
        }
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn genes_mut(&mut self) -> &mut [Gene] {
        &mut self.genes
    }

    pub fn into_genes(self) -> Vec<Gene> {
        self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn set(&mut self, index: usize, gene: Gene) {
        self.genes[index] = gene;
    }

    /// True when no position is assigned
    pub fn is_blank(&self) -> bool {
        self.genes.iter().all(Option::is_none)
    }

    pub fn assigned_count(&self) -> usize {
        self.genes.iter().filter(|g| g.is_some()).count()
    }

    /// Order-independent identity key (sorted gene vector)
    pub fn key(&self) -> IndividualKey {
        let mut key = self.genes.clone();
        key.sort();
        key
    }

    /// Whether a gene references only existing entities, a qualified
    /// teacher, and a suitable room. Validity is context-free; feasibility
    /// against other genes is settled during decoding.
    pub fn gene_valid(school: &School, gene: &LessonSlot) -> bool {
        let Some(subject) = school.subject_by_name(&gene.subject) else {
            return false;
        };
        let Some(teacher) = school.teacher_by_id(&gene.teacher_id) else {
            return false;
        };
        let Some(room) = school.room_by_id(&gene.room_id) else {
            return false;
        };
        school.class_by_name(&gene.class_group).is_some()
            && teacher.can_teach(&gene.subject)
            && crate::feasibility::room_suitable(subject, room)
    }

    /// Decode into the conflict-checked timetable view.
    ///
    /// Invalid genes are dropped. The remainder is inserted in `(day, hour)`
    /// order (stable, so equal-slot genes keep their vector order) and any
    /// gene whose insertion would double-book a teacher, room, or class is
    /// dropped as well.
    pub fn decode(&self, school: &School) -> Timetable {
        let mut valid: Vec<&LessonSlot> = self
            .genes
            .iter()
            .flatten()
            .filter(|gene| {
                let ok = Self::gene_valid(school, gene);
                if !ok {
                    debug!("dropping invalid gene on decode: {gene}");
                }
                ok
            })
            .collect();
        valid.sort_by_key(|gene| (gene.day, gene.hour));

        let mut timetable = Timetable::new();
        for gene in valid {
            if !timetable.try_insert(gene.clone()) {
                debug!("dropping conflicting gene on decode: {gene}");
            }
        }
        timetable
    }

    /// Re-encode a timetable as an individual of the given length,
    /// padding with unassigned genes. The inverse of [`Individual::decode`]
    /// up to gene permutation.
    pub fn encode(timetable: &Timetable, len: usize) -> Self {
        let mut genes: Vec<Gene> = timetable.lessons().iter().cloned().map(Some).collect();
        if genes.len() < len {
            genes.resize(len, None);
        }
        Self { genes }
    }
}
