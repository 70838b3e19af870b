//! ORF mapping, reference matching, scoring and selection.

pub mod mapping;
pub mod reference;
pub mod scoring;
pub mod selection;

pub use mapping::{genomic_to_offset, map_candidate, offset_to_genomic, TranscriptIndex};
pub use reference::{StartCodon, StartCodonIndex};
pub use scoring::{atg_score, count_upstream_codons, score_cds};
pub use selection::{select_orf, select_orfs};
