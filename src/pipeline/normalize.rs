//! Response normalisation: strip markdown fence artefacts from model output.
//!
//! Models are told to return only XML, yet many still wrap the answer in
//! a ```` ```xml ```` fence. The cleanup here is a literal substring pass, not
//! a parser: the markers are removed wherever they occur, not only at the
//! edges, and the result is not checked for well-formedness.
//!
//! Removal order matters. `"```xml\n"` goes first so its language tag goes
//! with it; then `"```\n"`; then any bare `"```"` left over.

/// Fence markers removed from model output, in removal order.
pub const FENCE_MARKERS: [&str; 3] = ["```xml\n", "```\n", "```"];

/// Strip fence markers anywhere in `raw`, then trim surrounding whitespace.
pub fn normalize_response(raw: &str) -> String {
    FENCE_MARKERS
        .iter()
        .fold(raw.to_string(), |s, marker| s.replace(marker, ""))
        .trim()
        .to_string()
}
