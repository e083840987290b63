use crate::models::{ChatMessage, Note};

pub(crate) const APP_TITLE: &str = "AI Notes";

pub(crate) const GREETING: &str = "Hello! I'm your AI assistant. How can I help you today?";

/// Assistant reply shown when retrieval finds nothing; no chat request is made then.
pub(crate) const NO_MATCHES_REPLY: &str = "I couldn't find any notes that might help with that.";

/// Seed history for chatting about the open note.
pub(crate) fn note_conversation(note: &Note) -> Vec<ChatMessage> {
    let system = format!(
        "You are a helpful AI assistant, integrated into a note-taking app called {APP_TITLE}.\n\
         The user currently has open a note titled \"{}\". Here is the note content:\n\
         <NOTE CONTENT START>\n\
         {}\n\
         <NOTE CONTENT END>\n\
         You can chat with the user to provide assistance or answer questions.",
        note.title, note.content
    );

    vec![ChatMessage::system(system), ChatMessage::assistant(GREETING)]
}

/// Appends the trimmed user input. Blank input leaves the history untouched.
pub(crate) fn push_user_message(history: &mut Vec<ChatMessage>, text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    history.push(ChatMessage::user(text));
    true
}

/// Messages shown in the transcript (the system prompt stays hidden).
pub(crate) fn visible_messages(history: &[ChatMessage]) -> Vec<ChatMessage> {
    history
        .iter()
        .filter(|m| m.role != crate::models::ChatRole::System)
        .cloned()
        .collect()
}

/// Question answering over retrieved notes.
pub(crate) fn rag_conversation(notes: &[Note], query: &str) -> Vec<ChatMessage> {
    let retrieved: Vec<serde_json::Value> = notes
        .iter()
        .map(|n| serde_json::json!({ "title": n.title, "content": n.content }))
        .collect();
    let retrieved =
        serde_json::to_string_pretty(&retrieved).unwrap_or_else(|_| "[]".to_string());

    let system = format!(
        "You are a helpful AI assistant, integrated into a note-taking app called {APP_TITLE}.\n\
         Your job is to answer questions based on the content of the user's notes.\n\
         The following is a list of notes that the system has retrieved as possibly relevant to the user's query. \
         This system is not perfect, so if the notes are not relevant, please let the user know that you are unable \
         to assist by saying \"I'm sorry, I am unable to assist with that.\" If you are able to answer the user's \
         question, please provide the answer and make sure to include the title of the note (or notes) that the \
         answer is based on.\n\
         Here are the notes that the system has retrieved:\n\
         {retrieved}"
    );

    vec![ChatMessage::system(system), ChatMessage::user(query.trim())]
}
