//! 提示词模板
//!
//! 出题和质检两类提示词，`{topic}` 等占位符在构造时替换

use super::generation_service::{Difficulty, QuestionType};

/// 可选的解题类细分题型
pub const PROBLEM_SOLVING_FILTERS: &[&str] = &[
    "Output prediction",
    "Error identification",
    "Debugging",
    "Code completion",
    "Time complexity",
    "Space complexity",
    "Concept identification",
    "Best practices",
    "Function behavior",
    "Variable state",
    "Logical equivalence",
    "Code optimization",
    "Output ordering",
    "Data structure selection",
    "Algorithm selection",
];

/// 质检回复中报告部分的起始标记
pub const QC_REPORT_MARKER: &str = "=== QC REPORT ===";

const GENERATION_TEMPLATE: &str = r#"Generate {count} unique multiple-choice questions (MCQs) about {topic} with {difficulty} difficulty. The questions should be of type: {question_type}.

Topic Focus: every question must be directly related to {topic}.

Difficulty Levels:
{difficulty_definition}

Question Types:
{question_type_instruction}

Format each question and answer exactly as follows:

Q1. [Question text]
```[language]
[code, only when the question needs it]
```
1) [Option 1]
2) [Option 2]
3) [Option 3]
4) [Option 4]
Correct answer: [Correct option number]
Difficulty: {difficulty}
Subject: [Relevant subject area]
Topic: {topic}
Sub-topic: [Relevant sub-topic of {topic}]
Tags: [Comma-separated tags related to {topic}]
---

Repeat this format for all {count} questions, numbering them Q1 to Q{count}, and end every question with a line containing only "---".
"#;

const CONCEPTUAL_INSTRUCTION: &str = "Focus on theoretical understanding of {topic}. Questions should test definitions, principles and concepts without necessarily involving code.";

const FACTUAL_INSTRUCTION: &str = "Emphasize specific facts, rules or characteristics of {topic}. Questions should test recall and precise knowledge.";

const SCENARIO_INSTRUCTION: &str = "Describe a short, realistic situation in which {topic} is applied and ask which decision, behavior or outcome is correct. Keep each scenario self-contained.";

const PROBLEM_SOLVING_INSTRUCTION: &str = r#"Provide code snippets where required and mix these kinds of questions about {topic}:
1. Output prediction: what the code prints
2. Error identification: which line contains an error
3. Debugging: which change fixes the bug (options in code format)
4. Code completion: which option completes the missing part
5. Concept identification: which concept the snippet demonstrates
6. Best practices: which change improves the code
7. Function behavior: what the function does
8. Variable state: value of a variable after execution
9. Logical equivalence: which snippet is equivalent
10. Code optimization: most optimized version
11. Algorithm selection: most appropriate algorithm
12. Time complexity / Space complexity of the given code
When an option is code, wrap it in a fenced block."#;

const CONCEPTUAL_EASY: &str = "- Test basic understanding and recall of {topic}\n- Use simple terminology and straightforward questions\n- Clear, distinct options with only one correct answer";
const CONCEPTUAL_MEDIUM: &str = "- Test deeper understanding of {topic}\n- Apply knowledge in slightly more complex scenarios or compare related concepts\n- Nuanced options that need careful consideration";
const CONCEPTUAL_HARD: &str = "- Test intricate details and edge cases of {topic}\n- Require analysis and evaluation\n- Very plausible distractors that need expert knowledge";

const PROBLEM_EASY: &str = "- Test basic syntax and simple concepts of {topic}\n- Single operations or straightforward snippets\n- Clear, distinct options with only one correct answer";
const PROBLEM_MEDIUM: &str = "- Apply {topic} in moderately complex, multi-step code\n- Short snippets with control flow, simple algorithms or data structures\n- Nuanced distractors about runtime behavior";
const PROBLEM_HARD: &str = "- Apply advanced {topic} concepts in complex code\n- Optimization, debugging of non-trivial code, underlying principles\n- Very plausible distractors that need expert knowledge";

fn difficulty_definition(question_type: QuestionType, difficulty: Difficulty) -> &'static str {
    let code_heavy = matches!(
        question_type,
        QuestionType::ProblemSolving | QuestionType::ScenarioBased
    );
    match (code_heavy, difficulty) {
        (false, Difficulty::Easy) => CONCEPTUAL_EASY,
        (false, Difficulty::Medium) => CONCEPTUAL_MEDIUM,
        (false, Difficulty::Hard) => CONCEPTUAL_HARD,
        (true, Difficulty::Easy) => PROBLEM_EASY,
        (true, Difficulty::Medium) => PROBLEM_MEDIUM,
        (true, Difficulty::Hard) => PROBLEM_HARD,
    }
}

fn question_type_instruction(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::Conceptual => CONCEPTUAL_INSTRUCTION,
        QuestionType::Factual => FACTUAL_INSTRUCTION,
        QuestionType::ProblemSolving => PROBLEM_SOLVING_INSTRUCTION,
        QuestionType::ScenarioBased => SCENARIO_INSTRUCTION,
    }
}

/// 构建出题消息，返回 (user_message, system_message)
pub fn build_generation_messages(
    topic: &str,
    count: usize,
    difficulty: Difficulty,
    question_type: QuestionType,
    filters: &[String],
) -> (String, String) {
    let mut instruction = question_type_instruction(question_type).replace("{topic}", topic);
    if question_type == QuestionType::ProblemSolving && !filters.is_empty() {
        instruction.push_str(&format!(
            "\nFocus specifically on these types of problem-solving questions: {}.",
            filters.join(", ")
        ));
    }

    let user_message = GENERATION_TEMPLATE
        .replace("{difficulty_definition}", &difficulty_definition(question_type, difficulty).replace("{topic}", topic))
        .replace("{question_type_instruction}", &instruction)
        .replace("{question_type}", question_type.as_str())
        .replace("{difficulty}", difficulty.as_str())
        .replace("{count}", &count.to_string())
        .replace("{topic}", topic);

    let system_message = format!(
        "You are an expert in {topic}. Generate multiple-choice questions specifically about {topic}, \
         following the given instructions for {} questions at {} difficulty.",
        question_type.as_str(),
        difficulty.as_str()
    );

    (user_message, system_message)
}

/// 构建质检消息
///
/// # 参数
/// - `ordinals`: 本批题号，回复必须原样保留
/// - `batch_text`: 本批题目原文
pub fn build_qc_message(ordinals: &[u32], batch_text: &str) -> String {
    let numbers = ordinals
        .iter()
        .map(|n| format!("Q{}", n))
        .collect::<Vec<_>>()
        .join(", ");
    let count = ordinals.len();

    format!(
        r#"Review these {count} MCQs and output them in the following format:

Q[number]. [Question text]
```[language]
[code]
```
1) [option]
2) [option]
3) [option]
4) [option]
Correct answer: [number]
Difficulty: [Easy/Medium/Hard]
Subject: [subject]
Topic: [topic]
Sub-topic: [subtopic]
Tags: [comma, separated, tags]
---

CRITICAL:
1. Output EXACTLY {count} questions
2. Use these exact numbers: {numbers}
3. Keep questions in the same order
4. Add "---" after each question
5. After all questions, add your QC report starting with "{QC_REPORT_MARKER}"
6. If a question needs no change, output it unchanged and say "No issues found" for it in the report

Check technical accuracy, syntactically correct code with proper indentation, clear unambiguous wording,
plausible and distinct options, and that the difficulty label matches the question.
Never use "None of the above", "All of the above", compound options or True/False questions.

Here are the questions to review:

{batch_text}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_prompt_fills_placeholders() {
        let (user, system) = build_generation_messages(
            "Rust ownership",
            5,
            Difficulty::Medium,
            QuestionType::ProblemSolving,
            &["Debugging".to_string(), "Output prediction".to_string()],
        );
        assert!(user.contains("Generate 5 unique"));
        assert!(user.contains("Rust ownership"));
        assert!(user.contains("Focus specifically on these types of problem-solving questions: Debugging, Output prediction."));
        assert!(!user.contains("{topic}"));
        assert!(!user.contains("{count}"));
        assert!(system.contains("Problem-solving"));
    }

    #[test]
    fn test_filters_ignored_for_conceptual() {
        let (user, _) = build_generation_messages(
            "HTTP",
            2,
            Difficulty::Easy,
            QuestionType::Conceptual,
            &["Debugging".to_string()],
        );
        assert!(!user.contains("Focus specifically"));
    }

    #[test]
    fn test_qc_message_lists_ordinals() {
        let msg = build_qc_message(&[6, 7], "Q6. a\n---\n\nQ7. b\n---");
        assert!(msg.contains("Output EXACTLY 2 questions"));
        assert!(msg.contains("Q6, Q7"));
        assert!(msg.contains(QC_REPORT_MARKER));
    }
}
