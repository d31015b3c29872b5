use super::*;
use crate::memory::Turn;

const SYS: &str = "You are a test assistant.";

fn session_with(turns: usize) -> SessionMemory {
    let mut session = SessionMemory::new(10);
    for n in 1..=turns {
        session.push(Turn::new(format!("q{}", n), format!("a{}", n)));
    }
    session
}

fn options(persistent: bool, session: bool, recent: usize) -> PromptOptions {
    PromptOptions {
        persistent_memory: persistent,
        session_memory: session,
        recent_turns: recent,
    }
}

#[test]
fn both_memories_disabled_is_exact() {
    let mut persistent = PersistentMemory::new();
    persistent.insert("name", "Alex");
    let session = session_with(3);

    let prompt = build_prompt(SYS, &persistent, &session, "What is XSS?", &options(false, false, 5));
    assert_eq!(prompt, format!("{}\nUser: What is XSS?\nAssistant:", SYS));
}

#[test]
fn empty_memories_are_omitted() {
    let prompt = build_prompt(
        SYS,
        &PersistentMemory::new(),
        &SessionMemory::new(10),
        "hi",
        &options(true, true, 5),
    );
    assert_eq!(prompt, format!("{}\nUser: hi\nAssistant:", SYS));
}

#[test]
fn full_layout_in_order() {
    let persistent: PersistentMemory = [("name", "Alex"), ("role", "pentester")]
        .into_iter()
        .collect();
    let session = session_with(1);

    let prompt = build_prompt(SYS, &persistent, &session, "next?", &options(true, true, 5));
    let expected = [
        SYS,
        "",
        "--- User Information ---",
        "name: Alex",
        "role: pentester",
        "",
        "--- Recent Conversation ---",
        "User: q1",
        "Assistant: a1",
        "User: next?",
        "Assistant:",
    ]
    .join("\n");
    assert_eq!(prompt, expected);
}

#[test]
fn recent_window_limits_replayed_turns() {
    let session = session_with(3);
    let prompt = build_prompt(
        SYS,
        &PersistentMemory::new(),
        &session,
        "m",
        &options(false, true, 2),
    );

    assert!(!prompt.contains("User: q1"));
    let q2 = prompt.find("User: q2").unwrap();
    let q3 = prompt.find("User: q3").unwrap();
    assert!(q2 < q3);
    assert_eq!(prompt.matches("Assistant: a").count(), 2);
}

#[test]
fn prompt_ends_with_the_bare_assistant_label() {
    let session = session_with(7);
    let prompt = build_prompt(SYS, &PersistentMemory::new(), &session, "m", &PromptOptions::default());
    assert!(prompt.ends_with("\nUser: m\nAssistant:"));
    // Default window is five turns.
    assert_eq!(prompt.matches("Assistant: a").count(), 5);
}

#[test]
fn payload_blocks_follow_memory_state() {
    let persistent: PersistentMemory = [("k", "v")].into_iter().collect();
    let session = session_with(2);

    let payload = format_context(SYS, &persistent, &session, &options(true, false, 5));
    assert_eq!(payload.blocks.len(), 1);
    assert!(matches!(payload.blocks[0], Block::UserInformation(_)));

    let payload = format_context(SYS, &persistent, &session, &options(false, true, 0));
    assert!(payload.blocks.is_empty());
}

#[test]
fn system_prompt_is_the_cybersecurity_persona() {
    assert!(SYSTEM_PROMPT.starts_with("You are R3KON GPT, a professional cybersecurity assistant. CRITICAL RULES:\n1."));
    assert!(SYSTEM_PROMPT.ends_with("politely redirect to cybersecurity topics.\n"));
}

#[test]
fn quick_commands_map_to_fixed_prompts() {
    assert_eq!(
        QuickCommand::Summarize.prompt(),
        "Summarize your last response in 2-3 bullet points."
    );
    assert_eq!(
        QuickCommand::Explain.prompt(),
        "Explain your last response in simpler terms."
    );
}

#[test]
fn cleaner_trims_and_rejects_blank_input() {
    assert_eq!(Cleaner::clean("  nmap -sV  \n").unwrap(), "nmap -sV");
    assert_eq!(Cleaner::clean(" \t\n"), Err(CleanerError::EmptyInput));
}
