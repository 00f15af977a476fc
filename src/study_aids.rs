//! Per-node quiz questions and flashcards.

use crate::error::Result;
use crate::generation::ContentGenerator;
use crate::outline::{aggregate_content, count_nodes, has_content, Flashcard, IdeaNode, Outline, QuizQuestion};
use crate::pipeline::ProgressSink;
use serde::Deserialize;
use tracing::{debug, warn};

/// Back of a flashcard whose question points at a missing option.
const MISSING_ANSWER: &str = "Answer not found";

#[derive(Debug, Deserialize)]
struct QuizResponse {
    #[serde(rename = "quizQuestions")]
    quiz_questions: Option<Vec<QuizQuestion>>,
}

/// Parse a quiz response; `None` when it is not JSON or has no question list.
fn parse_quiz(response: &str) -> Option<Vec<QuizQuestion>> {
    serde_json::from_str::<QuizResponse>(response)
        .ok()
        .and_then(|r| r.quiz_questions)
}

/// One flashcard per question: the question on the front, the correct option on the back.
pub fn flashcards_from_quiz(questions: &[QuizQuestion]) -> Vec<Flashcard> {
    questions
        .iter()
        .map(|q| Flashcard {
            front: q.question.clone(),
            back: q.correct_answer().unwrap_or(MISSING_ANSWER).to_string(),
        })
        .collect()
}

/// Fill `flashcards` and `quizQuestions` on every node, depth-first.
///
/// Requests are issued one node at a time. A failed or unusable response
/// leaves that node with empty lists; it never fails the whole stage.
pub async fn generate_study_aids(
    generator: &dyn ContentGenerator,
    content: &Outline,
    progress: &dyn ProgressSink,
) -> Result<Outline> {
    let mut outline = content.clone();
    let total = count_nodes(&outline.ideas);
    let mut done = 0usize;

    for idea in outline.ideas.iter_mut() {
        process_node(generator, idea, progress, &mut done, total).await;
    }

    Ok(outline)
}

// Boxed because async recursion needs an indirection.
fn process_node<'a>(
    generator: &'a dyn ContentGenerator,
    node: &'a mut IdeaNode,
    progress: &'a dyn ProgressSink,
    done: &'a mut usize,
    total: usize,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
    Box::pin(async move {
        *done += 1;
        progress.message(&format!(
            "Generating study aids for node {} of {}...",
            done, total
        ));

        let questions = aids_for_node(generator, node).await;
        node.flashcards = Some(flashcards_from_quiz(&questions));
        node.quiz_questions = Some(questions);

        if let Some(children) = node.children_mut() {
            for child in children.iter_mut() {
                process_node(generator, child, progress, done, total).await;
            }
        }
    })
}

async fn aids_for_node(generator: &dyn ContentGenerator, node: &IdeaNode) -> Vec<QuizQuestion> {
    if !has_content(node) {
        debug!(id = %node.id, "Skipping node without content");
        return Vec::new();
    }

    let material = aggregate_content(node);
    match generator.generate_study_aids(&node.title, &material).await {
        Ok(response) => parse_quiz(&response).unwrap_or_else(|| {
            warn!(id = %node.id, "Study aid response has no quiz questions");
            Vec::new()
        }),
        Err(e) => {
            warn!(id = %node.id, error = %e, "Study aid generation failed");
            Vec::new()
        }
    }
}
