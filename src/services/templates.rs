use serde::{Deserialize, Serialize};

/// Languages the coding editor offers. The wire form is the lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum CodeLanguage {
    C,
    Cpp,
    Java,
    Python,
}

/// Starter code shown when a coding question has no answer yet.
pub(crate) fn starter_template(language: CodeLanguage) -> &'static str {
    match language {
        CodeLanguage::C => {
            "#include <stdio.h>\n\nint main() {\n    // Write your code here\n    return 0;\n}\n"
        }
        CodeLanguage::Cpp => {
            "#include <iostream>\nusing namespace std;\n\nint main() {\n    // Write your code here\n    return 0;\n}\n"
        }
        CodeLanguage::Java => {
            "public class Main {\n    public static void main(String[] args) {\n        // Write your code here\n    }\n}\n"
        }
        CodeLanguage::Python => "# Write your code here\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_has_a_template() {
        for language in
            [CodeLanguage::C, CodeLanguage::Cpp, CodeLanguage::Java, CodeLanguage::Python]
        {
            assert!(!starter_template(language).is_empty());
        }
    }

    #[test]
    fn wire_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&CodeLanguage::Cpp).unwrap(), "\"cpp\"");
        let parsed: CodeLanguage = serde_json::from_str("\"python\"").unwrap();
        assert_eq!(parsed, CodeLanguage::Python);
    }
}
