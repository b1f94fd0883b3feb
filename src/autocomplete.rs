//! Static keyword and snippet tables, filtered by prefix.

use serde::Serialize;

type KeywordTable = &'static [(&'static str, &'static [&'static str])];
type SnippetTable = &'static [(&'static str, &'static [(&'static str, &'static str)])];

const KEYWORDS: KeywordTable = &[
  (
    "python",
    &[
      "def", "class", "if", "else", "elif", "for", "while", "try", "except", "import", "from",
      "return", "yield", "lambda", "async", "await", "with",
    ],
  ),
  (
    "javascript",
    &[
      "function", "const", "let", "var", "if", "else", "for", "while", "try", "catch", "import",
      "export", "return", "async", "await", "class", "extends", "super",
    ],
  ),
  (
    "typescript",
    &[
      "function", "const", "let", "var", "if", "else", "for", "while", "try", "catch", "import",
      "export", "return", "async", "await", "class", "interface", "type",
    ],
  ),
  (
    "java",
    &[
      "public", "private", "class", "interface", "if", "else", "for", "while", "try", "catch",
      "import", "return", "new", "static", "final", "abstract", "extends", "implements",
    ],
  ),
];

const SNIPPETS: SnippetTable = &[
  (
    "python",
    &[
      ("def", "def ${1:function_name}(${2:args}):\n    ${3:pass}"),
      (
        "class",
        "class ${1:ClassName}:\n    def __init__(self):\n        ${2:pass}",
      ),
    ],
  ),
  (
    "javascript",
    &[
      ("function", "function ${1:name}(${2:params}) {\n    ${3:}\n}"),
      ("const", "const ${1:name} = ${2:value};"),
      ("arrow", "const ${1:name} = (${2:params}) => {\n    ${3:}\n};"),
    ],
  ),
  (
    "typescript",
    &[
      (
        "function",
        "function ${1:name}(${2:params}): ${3:ReturnType} {\n    ${4:}\n}",
      ),
      ("interface", "interface ${1:Name} {\n    ${2:properties}\n}"),
    ],
  ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
  Keyword,
  Snippet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
  pub label: String,
  pub kind: SuggestionKind,
  pub detail: String,
  #[serde(rename = "insertText")]
  pub insert_text: Option<String>,
}

/// Keywords then snippets of `language` whose name starts with `prefix`.
///
/// Both the language key and the prefix are matched case-insensitively.
/// An unknown language yields no suggestions.
pub fn suggestions(language: &str, prefix: &str) -> Vec<Suggestion> {
  let key = language.to_lowercase();
  let prefix = prefix.to_lowercase();

  let keywords = KEYWORDS
    .iter()
    .find(|(lang, _)| *lang == key)
    .map(|(_, words)| *words)
    .unwrap_or_default();
  let snippets = SNIPPETS
    .iter()
    .find(|(lang, _)| *lang == key)
    .map(|(_, snippets)| *snippets)
    .unwrap_or_default();

  let keyword_matches = keywords
    .iter()
    .filter(|word| word.starts_with(&prefix))
    .map(|word| Suggestion {
      label: word.to_string(),
      kind: SuggestionKind::Keyword,
      detail: format!("{} keyword", language),
      insert_text: None,
    });
  let snippet_matches = snippets
    .iter()
    .filter(|(name, _)| name.starts_with(&prefix))
    .map(|(name, body)| Suggestion {
      label: name.to_string(),
      kind: SuggestionKind::Snippet,
      detail: "code snippet".to_owned(),
      insert_text: Some(body.to_string()),
    });

  keyword_matches.chain(snippet_matches).collect()
}

/// The `line`-th line of `code`, or an empty string when out of range.
pub fn line_context(code: &str, line: i64) -> &str {
  let lines: Vec<&str> = code.split('\n').collect();
  // Negative lines count back from the end: -1 is the last line.
  let index = if line < 0 {
    i64::try_from(lines.len()).ok().map(|len| len + line)
  } else {
    Some(line)
  };
  index
    .and_then(|index| usize::try_from(index).ok())
    .and_then(|index| lines.get(index).copied())
    .unwrap_or("")
}
