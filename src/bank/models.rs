use serde::{Deserialize, Serialize};

/// One flashcard. Identity is positional within its topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub answer: String,
}

impl Question {
    #[must_use]
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A named, ordered list of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
    pub questions: Vec<Question>,
}

/// Built-in topics written when no bank file exists yet.
#[must_use]
pub fn default_topics() -> Vec<Topic> {
    let topic = |name: &str, cards: [(&str, &str); 3]| Topic {
        name: name.to_string(),
        questions: cards
            .iter()
            .map(|(q, a)| Question::new(*q, *a))
            .collect(),
    };

    vec![
        topic(
            "math",
            [
                ("What is 2 + 2?", "4"),
                ("What is the square root of 16?", "4"),
                ("What is Pi approximately?", "3.1416"),
            ],
        ),
        topic(
            "history",
            [
                ("Who was the first President of the USA?", "George Washington"),
                ("In which year did World War II end?", "1945"),
                ("Where was Napoleon born?", "Corsica"),
            ],
        ),
        topic(
            "science",
            [
                ("What planet is known as the Red Planet?", "Mars"),
                ("What is the chemical symbol for water?", "H2O"),
                ("What gas do plants absorb from the atmosphere?", "Carbon Dioxide"),
            ],
        ),
        topic(
            "literature",
            [
                ("Who wrote 'Romeo and Juliet'?", "William Shakespeare"),
                ("Who is the author of '1984'?", "George Orwell"),
                ("Which novel starts with 'Call me Ishmael'?", "Moby Dick"),
            ],
        ),
    ]
}
