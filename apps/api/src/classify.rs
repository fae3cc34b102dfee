//! Complexity classifier — maps Brief-shaped hints to a gateway tier.
//!
//! Pure and deterministic: the same inputs always produce the same tier.
//! Runs before the gateway call; never consults the network.

use crate::gateway::Tier;
use crate::models::brief::DiagramType;

/// Prompt keywords that signal a structurally complex diagram.
const COMPLEXITY_LEXICON: &[&str] = &[
    "marketecture",
    "architecture",
    "ecosystem",
    "cross-cutting",
    "integration",
    "platform",
    "multi-layer",
    "hierarchy",
    "organizational",
    "value chain",
    "business units",
];

/// Entity counts above this promote simple archetypes to STANDARD.
const SIMPLE_ARCHETYPE_ENTITY_CAP: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct ClassifierInput<'a> {
    pub prompt: &'a str,
    pub diagram_type_hint: Option<DiagramType>,
    pub entity_count_hint: Option<usize>,
    pub has_images: bool,
}

/// Classifies a request into a tier. Rules apply in order; the first match
/// wins.
pub fn classify(input: &ClassifierInput<'_>) -> Tier {
    if input.has_images {
        return Tier::Vision;
    }

    if let Some(hint) = input.diagram_type_hint {
        match hint {
            DiagramType::ProcessFlow | DiagramType::Timeline | DiagramType::Comparison => {
                return if input
                    .entity_count_hint
                    .map(|n| n > SIMPLE_ARCHETYPE_ENTITY_CAP)
                    .unwrap_or(false)
                {
                    Tier::Standard
                } else {
                    Tier::Fast
                };
            }
            DiagramType::Marketecture
            | DiagramType::OrgStructure
            | DiagramType::HubSpoke
            | DiagramType::ValueChain => return Tier::Premium,
            DiagramType::TechStack => {}
        }
    }

    let folded = input.prompt.to_lowercase();
    let hits = COMPLEXITY_LEXICON
        .iter()
        .filter(|kw| folded.contains(*kw))
        .count();

    match hits {
        0 => Tier::Fast,
        1 => Tier::Standard,
        _ => Tier::Premium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(prompt: &str) -> ClassifierInput<'_> {
        ClassifierInput {
            prompt,
            ..Default::default()
        }
    }

    #[test]
    fn test_images_always_vision() {
        let mut i = input("simple three step process");
        i.has_images = true;
        assert_eq!(classify(&i), Tier::Vision);
    }

    #[test]
    fn test_simple_archetype_hint_is_fast() {
        let mut i = input("make a flow");
        i.diagram_type_hint = Some(DiagramType::ProcessFlow);
        assert_eq!(classify(&i), Tier::Fast);
    }

    #[test]
    fn test_simple_archetype_with_many_entities_is_standard() {
        let mut i = input("make a flow");
        i.diagram_type_hint = Some(DiagramType::Timeline);
        i.entity_count_hint = Some(9);
        assert_eq!(classify(&i), Tier::Standard);

        i.entity_count_hint = Some(8);
        assert_eq!(classify(&i), Tier::Fast);
    }

    #[test]
    fn test_complex_archetype_hint_is_premium() {
        for hint in [
            DiagramType::Marketecture,
            DiagramType::OrgStructure,
            DiagramType::HubSpoke,
            DiagramType::ValueChain,
        ] {
            let mut i = input("anything");
            i.diagram_type_hint = Some(hint);
            assert_eq!(classify(&i), Tier::Premium, "{hint:?} must be PREMIUM");
        }
    }

    #[test]
    fn test_lexicon_two_hits_premium() {
        // "marketecture" + "business units" = 2 hits
        let i = input("Build a Marketecture of OpenText Business Units");
        assert_eq!(classify(&i), Tier::Premium);
    }

    #[test]
    fn test_lexicon_one_hit_standard() {
        let i = input("show our data platform components");
        assert_eq!(classify(&i), Tier::Standard);
    }

    #[test]
    fn test_no_hits_fast() {
        let i = input("five steps to onboard a customer");
        assert_eq!(classify(&i), Tier::Fast);
    }

    #[test]
    fn test_classifier_is_deterministic() {
        let i = input("enterprise ecosystem integration map");
        let first = classify(&i);
        for _ in 0..10 {
            assert_eq!(classify(&i), first);
        }
    }

    #[test]
    fn test_case_folding() {
        let i = input("ARCHITECTURE of our PLATFORM");
        assert_eq!(classify(&i), Tier::Premium);
    }
}
