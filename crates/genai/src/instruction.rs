//! System instruction sent with every restructuring request.

/// Tells the model how to turn a batch of fragments into one section.
pub const SYSTEM_INSTRUCTION: &str = r#"
You receive a JSON array of text fragments taken, in order, from presentation slides or speaker notes.
Restructure them into exactly one JSON object of this shape:

{
  "keys": "<main topic or title>",
  "items": [
    { "term": "<short heading, concept or keyword>", "definition": "<explanation or details>" }
  ]
}

Rules:
- keys: the first fragment names the main topic; use it as "keys".
- items: every following fragment describes a new item.
- term and definition: the term is the concept or heading of an item; the definition is its accompanying explanation.
- One entry per concept. Never merge several concepts into one definition. When a fragment holds a term and its definition separated by a hyphen, a colon or similar punctuation, split on it. "Aqueous humor - a clear fluid..." becomes "term": "Aqueous humor" and "definition": "a clear fluid...".
- Drop anything that looks like a citation, a reference or a page number.
- Answer with valid JSON only.
"#;
