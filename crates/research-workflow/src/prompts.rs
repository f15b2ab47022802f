//! Prompt templates for the research workflow agents

use crate::model::ResearchTopics;

pub const INTENT_PROMPT: &str = r#"You are an intent recognition agent. Your task is to identify the user's intent from their message.

Set intent to 'chat' if the user is engaging in casual conversation, e.g. hello, how are you, tell me a joke, what is my name?
Set intent to 'research' if the user's request requires some research or information gathering, e.g. find information about a company, research a topic, generate a report, gather data.

Return the following JSON format:
{
    "intent": "chat" or "research",
    "user_message": "<original user message>"
}
"#;

pub const PLAN_PROMPT: &str = r#"You are a planning agent decomposing a user's research task for entities into structured research topics.

OBJECTIVE:
Break this into 2-5 key topics. Under each topic, include 1-3 retrieval-friendly steps.

RULES:
- Keep topics distinct and concrete (e.g., Carbon Disclosure)
- Use only provided entities
- Use a consistent step format: "Find (something) for (Entity)"
- Break down entities individually (e.g., "for Company-A", "for Company-B")
- Be specific about retrieval steps and do NOT generate steps like "Repeat above steps for ...", "Summary of overall report content"
- Scope a topic locally if it is specific to an entity (e.g., Company-A Diversity Strategy)
- Scope a topic globally if it is relevant to all entities (e.g., Macroeconomic and Sovereign Risk Analysis for France)
- Ensure each topic has at least one step

EXAMPLE:
{
    "user_message": "Research on france economy and recent developments.",
    "topics": [
        {
            "topic": "Macroeconomic and Sovereign Risk Analysis for France",
            "steps": [
                "Find population, income, economic growth rate, and inflation rate for France"
            ]
        },
        {
            "topic": "Carbon Disclosure for Company-A",
            "steps": [
                "Find 2023 Scope 1 and 2 emissions for Company-A"
            ]
        },
        {
            "topic": "Company-A Diversity Strategy",
            "steps": [
                "Analyze gender and ethnicity diversity at Company-A"
            ]
        }
    ]
}

Respond ONLY with valid JSON.
Do NOT use possessive forms (e.g., do NOT write "Aelwyn's Impact"). Instead, write "Impact for Aelwyn" or "Impact of Aelwyn".
Use the format: "Find (something) for (Entity)"
Do NOT use curly or smart quotes.
"#;

pub const CHAT_PROMPT: &str = "You're an intelligent assistant. Answer user's question or ask.";

pub const REPORT_INSTRUCTIONS: &str = "Based on the research plan, write a detailed report that directly answers the user's request. \
Use tools to search the web and gather relevant information for topics & steps in <research_topics> tag.";

/// Report agent input: the formatted plan and the original request
pub fn report_prompt(topics: &str, query: &str) -> String {
    format!("<research_topics>\n{topics}\n</research_topics>\n\n<request>\n{query}\n</request>\n")
}

/// Render a plan as `Topics and steps: ...` blocks, one per topic
pub fn format_topics(plan: &ResearchTopics) -> String {
    plan.topics
        .iter()
        .map(|topic| {
            let mut block = format!("Topics and steps: {}", topic.topic);
            for step in &topic.steps {
                block.push_str("\n- ");
                block.push_str(step);
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResearchTopic;

    fn plan() -> ResearchTopics {
        ResearchTopics {
            topics: vec![
                ResearchTopic {
                    topic: "A".into(),
                    steps: vec!["step1".into()],
                },
                ResearchTopic {
                    topic: "B".into(),
                    steps: vec!["step2".into(), "step3".into()],
                },
            ],
            user_message: "q".into(),
        }
    }

    #[test]
    fn test_format_topics() {
        assert_eq!(
            format_topics(&plan()),
            "Topics and steps: A\n- step1\nTopics and steps: B\n- step2\n- step3"
        );
    }

    #[test]
    fn test_topic_without_steps() {
        let plan = ResearchTopics {
            topics: vec![ResearchTopic {
                topic: "Lonely".into(),
                steps: vec![],
            }],
            user_message: String::new(),
        };
        assert_eq!(format_topics(&plan), "Topics and steps: Lonely");
    }

    #[test]
    fn test_report_prompt_layout() {
        let prompt = report_prompt(&format_topics(&plan()), "Compare A and B");
        assert!(prompt.starts_with("<research_topics>\nTopics and steps: A\n"));
        assert!(prompt.ends_with("</research_topics>\n\n<request>\nCompare A and B\n</request>\n"));
    }
}
