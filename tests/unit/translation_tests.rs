/*!
 * Tests for batch planning, context memory and response parsing
 */

use opensubtrans::errors::{ConfigError, ResponseFormatError};
use opensubtrans::translation::batch::{BatchPlanner, batch_count, plan};
use opensubtrans::translation::context::{ContextMemory, TermCategory, TermEntry, TermExtractor};
use opensubtrans::translation::prompts::TranslationPromptBuilder;
use opensubtrans::translation::response::parse_batch_response;

use crate::common;

#[test]
fn test_plan_withAnyBatchSize_shouldConcatenateToInput() {
    let entries = common::numbered_entries(23);

    for batch_size in 1..=25 {
        let batches = plan(&entries, batch_size).unwrap();
        let rejoined: Vec<_> = batches.iter().flat_map(|b| b.entries.clone()).collect();

        assert_eq!(rejoined, entries);
        assert_eq!(batches.len(), batch_count(entries.len(), batch_size as usize));
        assert!(batches.iter().all(|b| !b.entries.is_empty() && b.entries.len() <= batch_size as usize));
        assert!(batches.iter().enumerate().all(|(i, b)| b.ordinal == i));
    }
}

#[test]
fn test_plan_withNonPositiveBatchSize_shouldFail() {
    let entries = common::numbered_entries(3);
    assert_eq!(plan(&entries, 0).unwrap_err(), ConfigError::InvalidBatchSize(0));
    assert_eq!(plan(&entries, -1).unwrap_err(), ConfigError::InvalidBatchSize(-1));
}

#[test]
fn test_plan_withCharBudget_shouldSplitEarlier() {
    let entries = common::numbered_entries(6);
    let per_cue = entries[0].char_count();
    let batches = BatchPlanner::new(10).unwrap().with_max_chars(Some(per_cue * 2)).plan(&entries);

    assert_eq!(batches.len(), 3);
    assert!(batches.iter().all(|b| b.char_count() <= per_cue * 2));
}

#[test]
fn test_memory_withConflictingTargets_shouldKeepFirstSeen() {
    let mut memory = ContextMemory::new();
    memory.upsert(vec![TermEntry::new("Mary", "瑪麗", TermCategory::Name)]);
    let inserted = memory.upsert(vec![TermEntry::new("mary", "瑪莉", TermCategory::Name)]);

    assert!(inserted.is_empty());
    assert_eq!(memory.lookup("MARY").unwrap().target_term, "瑪麗");
    assert_eq!(memory.confidence("Mary"), 2);
}

#[test]
fn test_memory_pin_shouldOverrideEstablishedTerm() {
    let mut memory = ContextMemory::new();
    memory.upsert(vec![
        TermEntry::new("Mary", "瑪莉", TermCategory::Name),
        TermEntry::new("Paris", "巴黎", TermCategory::Place),
    ]);
    memory.pin(TermEntry::new("Mary", "瑪麗", TermCategory::Name));

    assert_eq!(memory.lookup("Mary").unwrap().target_term, "瑪麗");
    assert_eq!(memory.entries().next().unwrap().source_term, "Mary");
    assert_eq!(memory.len(), 2);
}

#[test]
fn test_memory_renderForPrompt_shouldBeStableAndOrdered() {
    let mut memory = ContextMemory::new();
    memory.upsert(vec![TermEntry::new("Mary", "瑪麗", TermCategory::Name)]);
    memory.upsert(vec![TermEntry::new("Hogwarts", "霍格華茲", TermCategory::Place)]);

    let rendered = memory.render_for_prompt();
    assert_eq!(rendered, "- Mary → 瑪麗 (name)\n- Hogwarts → 霍格華茲 (place)");
    assert_eq!(memory.render_for_prompt(), rendered);
    assert_eq!(ContextMemory::new().render_for_prompt(), "");
}

#[test]
fn test_memory_json_shouldRestoreOrderAndTargets() {
    let mut memory = ContextMemory::new();
    memory.upsert(vec![
        TermEntry::new("Mary", "瑪麗", TermCategory::Name),
        TermEntry::new("Excalibur", "王者之劍", TermCategory::OtherProperNoun),
    ]);

    let restored = ContextMemory::from_json(&memory.to_json().unwrap()).unwrap();
    assert_eq!(restored.render_for_prompt(), memory.render_for_prompt());

    let hand_written = r#"[{"source_term": "Bob", "target_term": "鮑伯", "category": "name"}]"#;
    assert_eq!(ContextMemory::from_json(hand_written).unwrap().lookup("bob").unwrap().target_term, "鮑伯");
}

#[test]
fn test_memory_checkConsistency_shouldFlagMissingTarget() {
    let mut memory = ContextMemory::new();
    memory.upsert(vec![TermEntry::new("Mary", "瑪麗", TermCategory::Name)]);

    assert!(memory.check_consistency("Mary is here.", "瑪麗在這裡。").is_empty());
    let issues = memory.check_consistency("Mary is here.", "瑪莉在這裡。");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].expected, "瑪麗");
}

#[test]
fn test_extractor_shouldSuggestNamesNotCommonWords() {
    let terms = TermExtractor::default().extract(&["Where is Mary?", "Mary went to London with Tom."]);

    assert!(terms.contains(&"Mary".to_string()));
    assert!(!terms.contains(&"Where".to_string()));
}

#[test]
fn test_promptBuilder_shouldTagEveryCueAndInjectMemory() {
    let mut memory = ContextMemory::new();
    memory.upsert(vec![TermEntry::new("Mary", "瑪麗", TermCategory::Name)]);
    let entries = common::numbered_entries(2);

    let (system, user) = TranslationPromptBuilder::new("English", "Chinese (Traditional)")
        .with_memory(&memory)
        .with_entries(&entries)
        .build();

    assert!(system.contains("Chinese (Traditional)"));
    assert!(system.contains("- Mary → 瑪麗 (name)"));
    assert!(user.contains("<<ENTRY_1>>\nLine number 1"));
    assert!(user.contains("<<ENTRY_2>>\nLine number 2"));
}

#[test]
fn test_parseBatchResponse_shouldMapEntriesAndTerms() {
    let text = "<<ENTRY_4>>\n瑪麗回家了。\n<<ENTRY_5>>\n車站在哪裡？\n已經很晚了。\n<<TERMS>>\nMary => 瑪麗 | name\n<<END>>";
    let response = parse_batch_response(text, &[4, 5]).unwrap();

    assert_eq!(response.lines_for(5).unwrap(), ["車站在哪裡？", "已經很晚了。"]);
    assert_eq!(response.terms, vec![TermEntry::new("Mary", "瑪麗", TermCategory::Name)]);
}

#[test]
fn test_parseBatchResponse_withStructuralProblems_shouldFail() {
    assert_eq!(parse_batch_response("", &[1]).unwrap_err(), ResponseFormatError::Empty);
    assert_eq!(parse_batch_response("<<ENTRY_1>>\nHi", &[1]).unwrap_err(), ResponseFormatError::MissingEndMarker);
    assert_eq!(parse_batch_response("<<ENTRY_1>>\nHi\n<<END>>", &[1, 2]).unwrap_err(), ResponseFormatError::MissingEntry(2));
    assert_eq!(
        parse_batch_response("<<ENTRY_1>>\nHi\n<<ENTRY_9>>\nX\n<<END>>", &[1]).unwrap_err(),
        ResponseFormatError::UnexpectedEntry(9)
    );
}
