//! Prompt templates for the three generative stages.
//!
//! One template type with named toggles covers every variant (topics on/off,
//! joke on/off, structured topic extraction on/off).

use chrono::{Datelike, NaiveDate};

use super::topics::{TopicList, MAX_TOPICS};

/// One heading of the digest layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigestSection {
    pub heading: String,
    pub guidance: String,
}

impl DigestSection {
    pub fn new(heading: impl Into<String>, guidance: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            guidance: guidance.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    /// Run topic extraction and ask the digest to prioritise the result.
    pub priority_topics: bool,
    /// Generate and send the closing joke.
    pub closing_joke: bool,
    /// Request JSON-object mode for topic extraction.
    pub structured_topics: bool,
    /// Subject-matter priority, e.g. "AI developments relevant to engineers".
    pub focus: String,
    pub title: String,
    pub sections: Vec<DigestSection>,
    /// Character budget stated to the model; keep it below the hard limit.
    pub char_budget: usize,
    pub joke_header: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            priority_topics: true,
            closing_joke: true,
            structured_topics: true,
            focus: "AI developments relevant to engineers and developers".to_string(),
            title: "ЕЖЕНЕДЕЛЬНЫЙ ДАЙДЖЕСТ ЗА".to_string(),
            sections: default_sections(),
            char_budget: 4000,
            joke_header: "**🤡 ШУТКА НЕДЕЛИ**".to_string(),
        }
    }
}

fn default_sections() -> Vec<DigestSection> {
    vec![
        DigestSection::new(
            "🤖 AI для инженеров",
            "HIGHEST PRIORITY SECTION: hardcore AI news valuable to engineers and developers: \
             new models, technical breakthroughs, new APIs or tools, performance improvements, \
             engineering practices, research with practical applications. \
             Be specific about technical details when available.",
        ),
        DigestSection::new(
            "📰 Основные новости",
            "Other news that can significantly impact work, technology or society: major tech \
             breakthroughs, important policy changes, significant scientific discoveries. \
             Exclude entertainment, memes and minor updates.",
        ),
        DigestSection::new(
            "🎮 Развлечения и интересное",
            "Fun facts, entertainment news, interesting but non-critical updates.",
        ),
        DigestSection::new(
            "📊 Другое",
            "Everything that does not fit the sections above.",
        ),
    ]
}

impl PromptTemplate {
    pub fn topics_instruction(&self) -> String {
        format!(
            "Analyze the provided text and identify the most frequently mentioned topics or themes.\n\
             Focus especially on {focus}.\n\
             Return a JSON object with a \"topics\" array holding the top 3-{MAX_TOPICS} most mentioned topics, \
             most frequent first.\n\
             Format: {{\"topics\": [\"topic1\", \"topic2\", \"topic3\"]}}",
            focus = self.focus
        )
    }

    pub fn digest_instruction(&self, date: NaiveDate, topics: &TopicList) -> String {
        let mut out = format!(
            "You are a news editor creating a structured Telegram post in Markdown format, \
             with a special focus on {}.\n\n",
            self.focus
        );

        if self.priority_topics && !topics.is_empty() {
            out.push_str(&format!(
                "The most frequently mentioned topics in the news are: {}. \
                 Pay special attention to these topics.\n\n",
                topics.join(", ")
            ));
        }

        out.push_str("Format the summary as follows:\n\n");
        out.push_str(&format!("**{} {}**\n\n", self.title, format_date_ru(date)));
        for section in &self.sections {
            out.push_str(&format!("**{}**\n({})\n\n", section.heading, section.guidance));
        }

        out.push_str(&format!(
            "For each news item:\n\
             - Start the line with a contextual emoji (e.g. 🧠 for AI, 🚀 for space, 💻 for tech, 🌍 for environment)\n\
             - Keep descriptions concise (1-2 sentences)\n\
             - If a link to the original message is available, put it on its own last line as a plain URL without markdown\n\
             - Message links must look like https://t.me/channelname/message_id\n\
             - Focus on facts, avoid speculation\n\
             - Leave a blank line between news items\n\
             - IMPORTANT: The total message length must not exceed {} characters\n\
             - If a topic is mentioned across multiple sources, prioritize it and note its significance\n\n\
             Format example:\n\
             🧠 New transformer architecture improves inference speed by 40%\n\
             What changed and how engineers can use it\n\
             https://t.me/channelname/123",
            self.char_budget
        ));
        out
    }

    pub fn joke_instruction(&self) -> String {
        format!(
            "You are a Russian standup comedian with a tech background. \
             Write a joke based on the news summary provided.\n\n\
             The joke MUST:\n\
             - Be in Russian standup club style\n\
             - Be short and punchy (1-5 lines max)\n\
             - Preferably be about AI, tech or engineering topics from the summary\n\
             - Have a clear punchline\n\
             - Be slightly sarcastic but not offensive\n\
             - Include technical humor engineers would appreciate\n\n\
             Format your response as:\n\n\
             {header}\n\n\
             \"Your joke here\"",
            header = self.joke_header
        )
    }
}

const MONTHS_GENITIVE_RU: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

/// Long Russian date, e.g. `17 октября 2026 г.`.
pub fn format_date_ru(date: NaiveDate) -> String {
    let month = MONTHS_GENITIVE_RU[date.month0() as usize];
    format!("{} {month} {} г.", date.day(), date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[test]
    fn formats_russian_long_date() {
        assert_eq!(format_date_ru(date()), "17 октября 2026 г.");
        assert_eq!(
            format_date_ru(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            "1 января 2025 г."
        );
    }

    #[test]
    fn digest_instruction_has_date_sections_and_budget() {
        let t = PromptTemplate::default();
        let s = t.digest_instruction(date(), &TopicList::default());
        assert!(s.contains("**ЕЖЕНЕДЕЛЬНЫЙ ДАЙДЖЕСТ ЗА 17 октября 2026 г.**"));
        for section in &t.sections {
            assert!(s.contains(&format!("**{}**", section.heading)));
        }
        assert!(s.contains("must not exceed 4000 characters"));
        assert!(!s.contains("most frequently mentioned topics"));
    }

    #[test]
    fn digest_instruction_prioritises_topics_when_enabled() {
        let topics = TopicList::new(vec!["LLM agents".to_string(), "GPUs".to_string()]);
        let mut t = PromptTemplate::default();
        let s = t.digest_instruction(date(), &topics);
        assert!(s.contains("LLM agents, GPUs. Pay special attention"));

        t.priority_topics = false;
        let s = t.digest_instruction(date(), &topics);
        assert!(!s.contains("LLM agents"));
    }

    #[test]
    fn joke_instruction_uses_header() {
        let t = PromptTemplate::default();
        assert!(t.joke_instruction().contains("**🤡 ШУТКА НЕДЕЛИ**"));
    }
}
