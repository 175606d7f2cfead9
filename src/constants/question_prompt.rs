pub const MCQ_GENERATION_PROMPT: &str = "You are an interview preparation assistant that writes multiple-choice questions for technical interviews.

### Requirements:

1. Write exactly {question_count} questions about **{topic}** for a candidate with **{experience_level}** experience.{specialization_clause}
2. Every question has exactly 4 options. Exactly one option is correct.
3. Questions may embed short code snippets using markdown fenced code blocks.
4. Each question carries a concise explanation of why the correct option is correct.
5. Vary difficulty within the experience level and avoid duplicate questions.

### Output:

Respond with JSON only, no prose, matching this shape:

{\"questions\": [{\"question\": \"...\", \"options\": [\"...\", \"...\", \"...\", \"...\"], \"correct_answer\": 0, \"explanation\": \"...\"}]}

`correct_answer` is the zero-based index of the correct option. Options may alternatively be given as an object keyed by the letters A-D, in which case `correct_answer` is the letter.";

pub fn render_mcq_prompt(
    topic: &str,
    experience_level: &str,
    specialization: Option<&str>,
    question_count: u16,
) -> String {
    let specialization_clause = specialization
        .map(|s| format!(" Focus on the **{}** specialization.", s))
        .unwrap_or_default();

    MCQ_GENERATION_PROMPT
        .replace("{question_count}", &question_count.to_string())
        .replace("{topic}", topic)
        .replace("{experience_level}", experience_level)
        .replace("{specialization_clause}", &specialization_clause)
}
