/// Topic id that selects random pages instead of a search.
pub const RANDOM_TOPIC: &str = "random";

/// Display name used when the selected topic is unknown.
pub const DEFAULT_TOPIC_NAME: &str = "Random Facts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic {
    pub id: &'static str,
    pub name: &'static str,
}

pub const TOPICS: [Topic; 10] = [
    Topic {
        id: RANDOM_TOPIC,
        name: DEFAULT_TOPIC_NAME,
    },
    Topic {
        id: "space",
        name: "Space & Astronomy",
    },
    Topic {
        id: "history",
        name: "History",
    },
    Topic {
        id: "science",
        name: "Science & Technology",
    },
    Topic {
        id: "nature",
        name: "Nature & Animals",
    },
    Topic {
        id: "geography",
        name: "Geography",
    },
    Topic {
        id: "art",
        name: "Art & Culture",
    },
    Topic {
        id: "sports",
        name: "Sports",
    },
    Topic {
        id: "inventions",
        name: "Inventions",
    },
    Topic {
        id: "human-body",
        name: "Human Body",
    },
];

#[must_use]
pub fn find_topic(id: &str) -> Option<&'static Topic> {
    TOPICS.iter().find(|topic| topic.id == id)
}

#[must_use]
pub fn topic_name(id: &str) -> &'static str {
    find_topic(id).map_or(DEFAULT_TOPIC_NAME, |topic| topic.name)
}
