use serde::{Deserialize, Serialize};

use peerscore_core::{Cliquism, Consensuality, Description, ReviewTopicId, ReviewTopicInput, Title};

/// One axis along which peers rate each other.
///
/// `consensuality` and `cliquism` stay empty until a round's reviews for
/// this topic are complete, and are overwritten by each later round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewTopic {
    pub id: ReviewTopicId,
    pub title: Title,
    pub description: Description,
    pub input: ReviewTopicInput,
    pub consensuality: Option<Consensuality>,
    pub cliquism: Option<Cliquism>,
}

impl ReviewTopic {
    pub fn new(
        id: ReviewTopicId,
        title: Title,
        description: Description,
        input: ReviewTopicInput,
    ) -> Self {
        Self {
            id,
            title,
            description,
            input,
            consensuality: None,
            cliquism: None,
        }
    }
}
