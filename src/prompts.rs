//! Extraction prompt shared by both providers.
//!
//! Ollama receives the built string as its `prompt`; Anthropic receives the
//! same string as the content of a single user message. Keeping the text here
//! means both backends see identical instructions.

/// Opening line of the extraction prompt.
pub const EXTRACTION_PREAMBLE: &str = "You are a data extraction expert. I have a document and an XML template. \
Your task is to extract relevant information from the document and fill in the XML template accurately.";

/// Ordered extraction instructions appended after the document and template.
pub const EXTRACTION_INSTRUCTIONS: &[&str] = &[
    "Analyze the document content carefully",
    "Identify what information needs to go into each field in the XML template",
    "Extract the relevant information from the document",
    "Fill in the XML template with the extracted data",
    "Maintain the exact XML structure and format",
    "For fields where information is not available in the document, leave them empty or use appropriate placeholder values",
    "Return ONLY the filled XML, no explanations or additional text",
];

/// Closing line that asks for the answer.
pub const EXTRACTION_CLOSING: &str = "Please provide the filled XML template now:";

/// Build the extraction prompt for `document` and `template`.
///
/// Both are embedded verbatim: no escaping, no truncation.
pub fn build_extraction_prompt(document: &str, template: &str) -> String {
    let instructions = EXTRACTION_INSTRUCTIONS
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{EXTRACTION_PREAMBLE}\n\n\
DOCUMENT CONTENT:\n{document}\n\n\
XML TEMPLATE:\n{template}\n\n\
Instructions:\n{instructions}\n\n\
{EXTRACTION_CLOSING}"
    )
}
