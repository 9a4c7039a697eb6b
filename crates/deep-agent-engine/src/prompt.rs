//! System prompt assembly for the orchestrator and sub-agents.

use chrono::Local;

const TODO_USAGE_INSTRUCTIONS: &str = "\
Use the todo tools to plan and track multi-step work.
- Call write_todos at the start of any task with more than one step, \
listing each step with status \"pending\".
- Mark exactly one todo \"in_progress\" at a time and set it to \
\"completed\" as soon as the step is done.
- Call read_todos before deciding the next step so the plan stays the \
source of truth.
- Rewrite the whole list when the plan changes rather than leaving \
stale entries.";

const FILE_USAGE_INSTRUCTIONS: &str = "\
You have a virtual workspace of named files.
- Use ls to see what exists, read_file to inspect content, and \
write_file to create or overwrite a file.
- Write intermediate results and drafts to files instead of keeping \
them only in conversation; files persist across the whole request.
- read_file supports offset and limit parameters for large files; read \
only what you need.";

const SUBAGENT_USAGE_INSTRUCTIONS: &str = "\
Delegate research to sub-agents with the task tool.
- Give a sub-agent exactly one self-contained topic per call and a \
complete description; it cannot ask follow-up questions and has no \
access to this conversation.
- Run at most {max_concurrent_research_units} research units \
concurrently and at most {max_researcher_iterations} delegation rounds \
per request.
- When the sub-agent returns, synthesize its findings into your own \
answer instead of quoting it wholesale.

Today's date is {date}.";

const RESEARCHER_INSTRUCTIONS: &str = "\
You are a focused research agent. Answer the single topic you were \
given using web search.
- Use tavily_search to gather sources, then think_tool to record what \
you learned and decide whether to search again or answer.
- Prefer a handful of high-quality searches over many shallow ones; \
stop as soon as you can answer confidently.
- Reply with a concise, well-organized summary of findings, citing the \
source URLs you relied on.

Today's date is {date}.";

const MAX_CONCURRENT_RESEARCH_UNITS: u32 = 3;
const MAX_RESEARCHER_ITERATIONS: u32 = 3;

fn today() -> String {
    Local::now().format("%a %b %-d, %Y").to_string()
}

/// System prompt for the top-level orchestrator agent.
pub fn orchestrator_prompt() -> String {
    let separator = "=".repeat(80);
    let subagent = SUBAGENT_USAGE_INSTRUCTIONS
        .replace(
            "{max_concurrent_research_units}",
            &MAX_CONCURRENT_RESEARCH_UNITS.to_string(),
        )
        .replace(
            "{max_researcher_iterations}",
            &MAX_RESEARCHER_ITERATIONS.to_string(),
        )
        .replace("{date}", &today());

    format!(
        "# TODO MANAGEMENT\n{TODO_USAGE_INSTRUCTIONS}\n\n{separator}\n\n\
         # FILE SYSTEM USAGE\n{FILE_USAGE_INSTRUCTIONS}\n\n{separator}\n\n\
         # SUB-AGENT DELEGATION\n{subagent}"
    )
}

/// System prompt for the research sub-agent.
pub fn researcher_prompt() -> String {
    RESEARCHER_INSTRUCTIONS.replace("{date}", &today())
}
