//! HTML entity decoding for trivia payloads.
//!
//! The trivia source encodes question and answer text with HTML entities
//! (`&quot;`, `&#039;`, `&eacute;`, `&pound;` ...). Decoding covers the full
//! HTML5 named entity set plus numeric references, in a single pass, so
//! `&amp;quot;` becomes `&quot;` and is not decoded twice.

/// Decode HTML entities in `input`. Unknown entities are kept verbatim.
pub fn decode_entities(input: &str) -> String {
    html_escape::decode_html_entities(input).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_common_trivia_entities() {
        assert_eq!(
            decode_entities("Which &quot;Star Wars&quot; film isn&#039;t a prequel?"),
            "Which \"Star Wars\" film isn't a prequel?"
        );
        assert_eq!(decode_entities("Pok&eacute;mon &amp; Co"), "Pokémon & Co");
        assert_eq!(decode_entities("&#x41;&#66;"), "AB");
    }

    #[test]
    fn decodes_entities_beyond_latin1_accents() {
        assert_eq!(
            decode_entities("&pound;5 &euro;3 x&sup2; &frac12; Caf&eacute;&lrm; &Delta;"),
            "£5 €3 x² ½ Café\u{200e} Δ"
        );
    }

    #[test]
    fn does_not_double_decode() {
        assert_eq!(decode_entities("&amp;quot;"), "&quot;");
    }

    #[test]
    fn leaves_plain_text_and_bare_ampersands() {
        assert_eq!(decode_entities("Tom & Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("no entities"), "no entities");
    }
}
