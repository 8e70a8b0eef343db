//! End-to-end runs of the ready-made patterns over scripted collaborators

#![allow(clippy::unwrap_used)] // Test code

use agentflow_core::{FlowError, GenerationError, SharedState};
use agentflow_patterns::planning::{TOPIC, planner_writer_persona};
use agentflow_patterns::prompt_chain::{SPECIFICATIONS, TEXT_INPUT};
use agentflow_patterns::reflection::{DRAFT_TEXT, SUBJECT};
use agentflow_patterns::tool_use::{AAPL_PRICE_TASK, ANSWER, INPUT};
use agentflow_patterns::{
    Critique, HardwareSpec, PlannedReport, Verdict, financial_analyst, plan_and_write,
    search_assistant, spec_extraction_chain, write_and_review,
};
use agentflow_runtime::{RunEvent, Runner, RunnerConfig};
use agentflow_testing::{PipelineTest, ScriptedGenerator};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

const LAPTOP: &str =
    "The new laptop model features a 3.5 GHz octa-core processor, 16GB of RAM, and a 1TB NVMe SSD.";

fn runner() -> Runner {
    Runner::new(RunnerConfig::new("sk-test").with_timeout(Duration::from_secs(5))).unwrap()
}

fn spec_script() -> ScriptedGenerator {
    ScriptedGenerator::new()
        .respond_when(
            "Extract the technical specifications",
            "Processor: 3.5 GHz octa-core\nMemory: 16GB RAM\nStorage: 1TB NVMe SSD",
        )
        .respond_when(
            "Transform the following specifications",
            "```json\n{\"cpu\": \"3.5 GHz octa-core\", \"memory\": \"16GB\", \"storage\": \"1TB NVMe SSD\"}\n```",
        )
}

#[tokio::test]
async fn spec_extraction_produces_a_hardware_spec() {
    let generator = Arc::new(spec_script());
    let pipeline = spec_extraction_chain(generator.clone()).unwrap();

    let state = runner()
        .invoke(&pipeline, SharedState::new().with(TEXT_INPUT, LAPTOP))
        .await
        .unwrap();

    let spec = HardwareSpec::from_state(&state).unwrap();
    assert!(spec.memory.contains("16GB"));
    assert!(spec.storage.contains("1TB"));
    assert_eq!(spec.cpu, "3.5 GHz octa-core");

    let prompts = generator.prompts();
    assert!(prompts[0].ends_with(LAPTOP));
    assert!(prompts[1].contains("Memory: 16GB RAM"));
    assert!(state.text(SPECIFICATIONS).unwrap().contains("1TB"));
}

#[tokio::test]
async fn spec_extraction_with_given_when_then() {
    let pipeline = spec_extraction_chain(Arc::new(spec_script())).unwrap();

    PipelineTest::new(&pipeline)
        .given_input(TEXT_INPUT, LAPTOP)
        .then_output(|output| {
            let spec = HardwareSpec::from_output(output).unwrap();
            assert_eq!(spec.memory, "16GB");
        })
        .run()
        .await;
}

#[tokio::test]
async fn reflection_reviews_a_pre_seeded_subject() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .respond_when("informative paragraph", "Honey never spoils when sealed.")
            .respond_when(
                "verify the factual accuracy",
                r#"{"status": "ACCURATE", "reasoning": "Sealed honey keeps for millennia."}"#,
            ),
    );
    let pipeline = write_and_review(generator).unwrap();
    let seeded = SharedState::new()
        .with(SUBJECT, "Honey")
        .with("audience", "children");

    PipelineTest::new(&pipeline)
        .given_state(seeded)
        .then_state(|state| {
            assert_eq!(state.text("audience"), Some("children"));
            assert!(Critique::from_state(state).unwrap().is_accurate());
        })
        .run()
        .await;
}

#[tokio::test]
async fn prose_instead_of_json_is_malformed_output() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .respond_when("Extract", "16GB RAM, 1TB SSD")
            .respond_when("Transform", "Sure! The CPU is fast and the memory is 16GB."),
    );
    let pipeline = spec_extraction_chain(generator).unwrap();

    let err = runner()
        .invoke(&pipeline, SharedState::new().with(TEXT_INPUT, LAPTOP))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FlowError::Generation { ref step, source: GenerationError::MalformedOutput(_) } if step == "transform"
    ));
}

#[tokio::test]
async fn reflection_returns_a_typed_critique() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .respond_when("informative paragraph", "The Great Wall of China is visible from the Moon.")
            .respond_when(
                "verify the factual accuracy",
                r#"{"status": "INACCURATE", "reasoning": "The wall is not visible to the naked eye from the Moon."}"#,
            ),
    );
    let pipeline = write_and_review(generator.clone()).unwrap();

    let state = runner()
        .invoke(&pipeline, SharedState::new().with(SUBJECT, "The Great Wall of China"))
        .await
        .unwrap();

    let critique = Critique::from_state(&state).unwrap();
    assert_eq!(critique.status, Verdict::Inaccurate);
    assert!(critique.reasoning.contains("naked eye"));
    assert!(state.text(DRAFT_TEXT).unwrap().contains("Great Wall"));
    assert!(generator.prompts()[1].contains("visible from the Moon"));
}

#[tokio::test]
async fn financial_analyst_reports_grounded_answer() {
    let generator = Arc::new(
        ScriptedGenerator::always("The simulated stock price for AAPL is $178.15.").with_provenance(1),
    );
    let pipeline = financial_analyst(generator.clone()).unwrap();
    let runner = runner();

    let events: Vec<RunEvent> = runner
        .stream(&pipeline, SharedState::new().with(INPUT, AAPL_PRICE_TASK))
        .map(Result::unwrap)
        .collect()
        .await;

    let Some(RunEvent::Completed { output, provenance, .. }) = events.last() else {
        unreachable!("completion is always last");
    };
    assert_eq!(output.as_text(), Some("The simulated stock price for AAPL is $178.15."));
    assert_eq!(provenance.map(|p| p.sources), Some(1));

    let recorded = generator.recorded();
    assert_eq!(recorded[0].options.temperature, Some(0.0));
    assert!(recorded[0].options.system.as_deref().unwrap().contains("Financial Analyst"));
}

#[tokio::test]
async fn search_assistant_answers_concurrent_questions_in_order() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .respond_when("capital of France", "The capital of France is Paris.")
            .respond_when("weather", "It is cloudy in London, 15°C.")
            .fallback("No specific information found about dogs."),
    );
    let pipeline = search_assistant(generator).unwrap();
    let questions = [
        "What is the capital of France?",
        "What's the weather like in London?",
        "Tell me something about dogs.",
    ];

    let results = runner()
        .invoke_all(&pipeline, questions.map(|q| SharedState::new().with(INPUT, q)))
        .await;

    let answers: Vec<String> = results
        .into_iter()
        .map(|result| result.unwrap().text(ANSWER).unwrap().to_string())
        .collect();
    assert_eq!(answers[0], "The capital of France is Paris.");
    assert!(answers[1].contains("London"));
    assert!(answers[2].contains("dogs"));
}

#[tokio::test]
async fn planning_renders_a_two_section_report() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .respond_when("bullet-point plan", "- Rewards\n- Exploration vs exploitation")
            .respond_when("based on this plan", "Reinforcement learning lets agents learn from reward."),
    );
    let pipeline = plan_and_write(generator.clone(), &planner_writer_persona()).unwrap();

    let state = runner()
        .invoke(
            &pipeline,
            SharedState::new().with(TOPIC, "The importance of Reinforcement Learning in AI"),
        )
        .await
        .unwrap();

    let report = PlannedReport::from_state(&state).unwrap().to_string();
    assert!(report.starts_with("### Plan\n- Rewards"));
    assert!(report.ends_with("### Summary\nReinforcement learning lets agents learn from reward."));
    assert!(generator.prompts()[1].contains("- Exploration vs exploitation"));
}
