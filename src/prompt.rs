use crate::model::{ConceptSet, Prompt};

const LABEL_SEPARATOR: &str = ", ";

/// Builds the generation prompt from detected concepts.
///
/// The output depends only on the concept names and their order. Callers must
/// not pass an empty set; the pipeline answers that case without a prompt.
pub fn build(concepts: &ConceptSet) -> Prompt {
    debug_assert!(!concepts.is_empty(), "prompt built from an empty concept set");
    let joined = concepts
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(LABEL_SEPARATOR);

    Prompt::new(format!(
        "Based on the following labels detected in an image: {joined}. \
         Please generate a single, descriptive sentence about the image."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Concept;

    fn concepts(names: &[&str]) -> ConceptSet {
        names.iter().map(|n| Concept::new(*n, 90.0)).collect()
    }

    #[test]
    fn test_template() {
        let prompt = build(&concepts(&["Cat", "Animal", "Pet"]));
        assert_eq!(
            prompt.as_str(),
            "Based on the following labels detected in an image: Cat, Animal, Pet. \
             Please generate a single, descriptive sentence about the image."
        );
    }

    #[test]
    fn test_deterministic() {
        let set = concepts(&["Tree", "Plant"]);
        assert_eq!(build(&set), build(&set));
    }

    #[test]
    fn test_ignores_confidence_but_keeps_order() {
        let a: ConceptSet = vec![Concept::new("Dog", 99.0), Concept::new("Ball", 81.0)]
            .into_iter()
            .collect();
        let b: ConceptSet = vec![Concept::new("Dog", 85.0), Concept::new("Ball", 84.0)]
            .into_iter()
            .collect();
        assert_eq!(build(&a), build(&b));
        assert_ne!(build(&a), build(&concepts(&["Ball", "Dog"])));
    }
}
