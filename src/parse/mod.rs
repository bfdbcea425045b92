pub mod canonical;
pub mod fragments;
pub mod shorthand;

pub use canonical::{canonicalize, normalize_label};
pub use fragments::{FragmentCapture, parse_fragments};
pub use shorthand::{FORMAT_HINT, Grammar, NoMatch, ParsedInput, parse, parse_with};
