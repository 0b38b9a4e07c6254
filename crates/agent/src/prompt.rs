//! Prompt texts: the system turn and the side questions the session asks.

use scoutline_core::tool::SearchResult;

/// Build the system turn that declares the tool contract.
pub fn system_prompt(enable_cot: bool) -> String {
    let mut prompt = String::from(
        "You are Scoutline, a research assistant with access to these tools:\n\
         - web_search: search the web. Arguments: {\"query\": string}\n\
         - read_url: read part of a web page as text. Arguments: {\"url\": string, \"start\": integer >= 0 (optional, default 0), \"length\": integer > 0 (optional, default 1122)}\n\
         - instant_answer: look up a short factual answer. Arguments: {\"query\": string}\n\
         \n\
         To use a tool, reply with ONLY a JSON object of the form\n\
         {\"tool\": \"<name>\", \"arguments\": {...}}\n\
         and nothing else. Tool results are added to the conversation as assistant turns; \
         read them and either call another tool or answer the user. \
         Cite the URLs you relied on.",
    );

    if enable_cot {
        prompt.push_str(
            "\n\nWhen you answer in prose, first write your reasoning after a line starting with \
             \"Thinking:\", then the final answer after a line starting with \"Answer:\".",
        );
    }

    prompt
}

pub const SUMMARIZER_SYSTEM: &str = "You condense research notes. Keep facts, figures, names and source URLs. \
     Drop navigation text and repetition. Reply with the summary only.";

pub fn summarize_request(question: Option<&str>, text: &str) -> String {
    match question {
        Some(q) => format!(
            "Summarize the following content with the question \"{q}\" in mind:\n\n{text}"
        ),
        None => format!("Summarize the following content:\n\n{text}"),
    }
}

pub const JUDGE_SYSTEM: &str =
    "You decide whether more of a document must be read. Reply with yes or no only.";

pub fn more_content_request(question: Option<&str>, url: &str, chunk: usize, text: &str) -> String {
    format!(
        "Question: {}\nDocument: {url}\nChunk {chunk} just read:\n{text}\n\n\
         Is more content from this document needed to answer the question? Reply yes or no.",
        question.unwrap_or("(none)")
    )
}

pub const SUGGEST_SYSTEM: &str = "You pick which search results are worth reading in full. \
     Reply with the result numbers separated by commas, for example: 1, 3. Reply none if no result is worth reading.";

pub fn suggest_request(question: Option<&str>, results: &[SearchResult]) -> String {
    let listing = results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {} ({}) - {}", i + 1, r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Question: {}\nSearch results:\n{listing}\n\nWhich results should be read in full?",
        question.unwrap_or("(none)")
    )
}
