/*!
 * Selection of the units that make up a highlight.
 *
 * - `relevance`: optional per-unit audience filter
 * - `converger`: iterative search for a summary of a target duration
 * - `selection`: oracle output resolved against the timeline
 */

pub mod converger;
pub mod relevance;
pub mod selection;

// Re-export main types
pub use converger::{ConvergedSummary, ConvergenceOptions, DurationConverger, IterationReport};
pub use relevance::RelevanceFilter;
pub use selection::Selection;
