use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::collaborators::QuestionBank;
use crate::error::QuestionBankError;
use crate::rng::{RandomSource, Rng};
use crate::types::Question;

#[derive(Debug, Deserialize)]
struct QuestionBankFileRaw {
    version: u8,
    zones: HashMap<String, Vec<serde_json::Value>>,
}

/// In-memory question pool keyed by zone. Each record is handed out at most
/// once per pool, in an order shuffled from the pool seed.
pub struct QuestionPool {
    zones: HashMap<String, Vec<Question>>,
    rng: Rng,
}

impl QuestionPool {
    pub fn new(zones: HashMap<String, Vec<Question>>, seed: u32) -> Self {
        Self {
            zones,
            rng: Rng::new(seed),
        }
    }

    pub fn empty() -> Self {
        Self::new(HashMap::new(), 0)
    }

    pub fn from_json_file(path: &Path, seed: u32) -> Result<Self, QuestionBankError> {
        let text = fs::read_to_string(path).map_err(|source| QuestionBankError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text, seed)
    }

    /// Parses `{"version": 1, "zones": {"<zone>": [question, ...]}}`.
    /// Malformed records are skipped with a warning.
    pub fn from_json_str(text: &str, seed: u32) -> Result<Self, QuestionBankError> {
        let raw: QuestionBankFileRaw = serde_json::from_str(text)?;
        if raw.version != 1 {
            return Err(QuestionBankError::UnsupportedVersion(raw.version));
        }

        let mut zones = HashMap::new();
        for (zone, records) in raw.zones {
            let mut questions = Vec::with_capacity(records.len());
            for (idx, value) in records.into_iter().enumerate() {
                match serde_json::from_value::<Question>(value) {
                    Ok(question) if question.is_well_formed() => questions.push(question),
                    Ok(_) => {
                        tracing::warn!(zone = %zone, idx, "skipping malformed question");
                    }
                    Err(error) => {
                        tracing::warn!(zone = %zone, idx, "failed to parse question: {error}");
                    }
                }
            }
            zones.insert(zone, questions);
        }
        Ok(Self::new(zones, seed))
    }

    /// Small bundled set covering every theme zone.
    pub fn builtin(seed: u32) -> Self {
        let mut zones = HashMap::new();
        for (zone, records) in BUILTIN {
            let questions = records
                .iter()
                .map(|(prompt, options, correct_index, explanation)| Question {
                    prompt: prompt.to_string(),
                    options: options.iter().map(|option| option.to_string()).collect(),
                    correct_index: *correct_index,
                    explanation: Some(explanation.to_string()),
                })
                .collect();
            zones.insert(zone.to_string(), questions);
        }
        Self::new(zones, seed)
    }

    pub fn remaining(&self, zone: &str) -> usize {
        self.zones.get(zone).map(Vec::len).unwrap_or(0)
    }
}

impl QuestionBank for QuestionPool {
    fn draw(&mut self, zone: &str, count: usize) -> Vec<Question> {
        let Some(pool) = self.zones.get_mut(zone) else {
            tracing::warn!(zone, "no questions for zone");
            return Vec::new();
        };
        let mut drawn = Vec::with_capacity(count.min(pool.len()));
        while drawn.len() < count && !pool.is_empty() {
            let idx = self.rng.pick_index(pool.len());
            drawn.push(pool.swap_remove(idx));
        }
        drawn
    }
}

type BuiltinRecord = (&'static str, &'static [&'static str], usize, &'static str);

const BUILTIN: &[(&str, &[BuiltinRecord])] = &[
    (
        "courtyard",
        &[
            (
                "Which river flows through Paris?",
                &["Thames", "Seine", "Danube", "Rhine"],
                1,
                "The Seine crosses Paris from east to west.",
            ),
            (
                "Who wrote 'Don Quixote'?",
                &["Cervantes", "Dante", "Goethe"],
                0,
                "Miguel de Cervantes published it in two parts, 1605 and 1615.",
            ),
            (
                "In which year did the Berlin Wall fall?",
                &["1979", "1989", "1991", "1999"],
                1,
                "The border opened on 9 November 1989.",
            ),
            (
                "What is the capital of Australia?",
                &["Sydney", "Melbourne", "Canberra"],
                2,
                "Canberra was purpose-built as a compromise between Sydney and Melbourne.",
            ),
            (
                "Which empire built Machu Picchu?",
                &["Aztec", "Maya", "Inca"],
                2,
                "It was built for the Inca emperor Pachacuti in the 15th century.",
            ),
        ],
    ),
    (
        "corridors",
        &[
            (
                "What is 7 x 8?",
                &["54", "56", "64"],
                1,
                "7 x 8 = 56.",
            ),
            (
                "Which gas do plants absorb for photosynthesis?",
                &["Oxygen", "Nitrogen", "Carbon dioxide"],
                2,
                "Plants take in CO2 and release oxygen.",
            ),
            (
                "How many sides does a hexagon have?",
                &["5", "6", "8"],
                1,
                "Hexa means six.",
            ),
            (
                "What is the chemical symbol for gold?",
                &["Go", "Gd", "Au", "Ag"],
                2,
                "Au comes from the Latin 'aurum'.",
            ),
            (
                "What is the square root of 144?",
                &["12", "14", "16"],
                0,
                "12 x 12 = 144.",
            ),
        ],
    ),
    (
        "pillars",
        &[
            (
                "Who painted the Mona Lisa?",
                &["Michelangelo", "Leonardo da Vinci", "Raphael"],
                1,
                "Leonardo worked on it from about 1503.",
            ),
            (
                "How many lines does a musical staff have?",
                &["4", "5", "6"],
                1,
                "The standard staff has five lines and four spaces.",
            ),
            (
                "Which composer wrote the 'Moonlight' Sonata?",
                &["Mozart", "Bach", "Beethoven"],
                2,
                "Piano Sonata No. 14 by Beethoven, 1801.",
            ),
            (
                "Which ancient wonder stood in Alexandria?",
                &["The Colossus", "The Lighthouse", "The Hanging Gardens"],
                1,
                "The Pharos lighthouse stood on the island of Pharos.",
            ),
            (
                "Which art movement is Salvador Dali associated with?",
                &["Cubism", "Surrealism", "Impressionism"],
                1,
                "Dali was a leading figure of Surrealism.",
            ),
        ],
    ),
    (
        "meadow",
        &[
            (
                "How many legs does a spider have?",
                &["6", "8", "10"],
                1,
                "Spiders are arachnids with eight legs.",
            ),
            (
                "Which bird is known for mimicking human speech?",
                &["Parrot", "Sparrow", "Owl"],
                0,
                "Parrots can imitate many sounds, including words.",
            ),
            (
                "What do bees collect from flowers to make honey?",
                &["Pollen", "Nectar", "Sap"],
                1,
                "Bees turn nectar into honey.",
            ),
            (
                "Which planet is closest to the sun?",
                &["Venus", "Mercury", "Mars"],
                1,
                "Mercury orbits at about 58 million km.",
            ),
            (
                "What is a baby frog called?",
                &["Tadpole", "Cub", "Fry"],
                0,
                "Frogs hatch as tadpoles.",
            ),
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_theme_zone() {
        let pool = QuestionPool::builtin(1);
        for zone in ["courtyard", "corridors", "pillars", "meadow"] {
            assert!(pool.remaining(zone) >= 4, "zone {zone} too small");
        }
        for records in pool.zones.values() {
            assert!(records.iter().all(Question::is_well_formed));
        }
    }

    #[test]
    fn draw_hands_out_each_record_once() {
        let mut pool = QuestionPool::builtin(9);
        let first = pool.draw("meadow", 3);
        let second = pool.draw("meadow", 3);
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 2);
        for question in &second {
            assert!(!first.contains(question));
        }
        assert!(pool.draw("meadow", 1).is_empty());
        assert!(pool.draw("unknown", 2).is_empty());
    }

    #[test]
    fn draw_order_follows_seed() {
        let a = QuestionPool::builtin(4).draw("pillars", 5);
        let b = QuestionPool::builtin(4).draw("pillars", 5);
        assert_eq!(a, b);
    }

    #[test]
    fn json_skips_malformed_records() {
        let text = r#"{
  "version": 1,
  "zones": {
    "courtyard": [
      {"prompt": "2 + 2?", "options": ["3", "4"], "correctIndex": 1},
      {"prompt": "bad index", "options": ["a", "b"], "correctIndex": 5},
      {"prompt": "no options"},
      {"prompt": "snake", "options": ["x", "y"], "correct_index": 0, "explanation": "ok"}
    ]
  }
}"#;
        let mut pool = QuestionPool::from_json_str(text, 1).expect("valid bank");
        assert_eq!(pool.remaining("courtyard"), 2);
        let drawn = pool.draw("courtyard", 4);
        assert_eq!(drawn.len(), 2);
    }

    #[test]
    fn json_rejects_unknown_version() {
        let error = QuestionPool::from_json_str(r#"{"version": 2, "zones": {}}"#, 1)
            .err()
            .expect("version error");
        assert!(matches!(error, QuestionBankError::UnsupportedVersion(2)));
        assert!(QuestionPool::from_json_str("not json", 1).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = QuestionPool::from_json_file(&dir.path().join("absent.json"), 1)
            .err()
            .expect("io error");
        assert!(matches!(error, QuestionBankError::Io { .. }));
    }
}
