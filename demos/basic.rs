//! Basic phonorule example: runs a small sound-change cascade.
//!
//! Usage:
//!   cargo run --example basic
//!   cargo run --example basic -- --text "ˈkæt.əp dɔɡ" --trace
//!
//! Prints the syllabification of the input, then the output of every rule.

use phonorule::{
    FeatureSpec, Inventory, Length, MarkPatch, Replacer, ReplacerConfig, SoundSelector,
};
use phonorule::Manner::Plosive;

fn main() -> anyhow::Result<()> {
    // ── Parse simple CLI arguments ───────────────────────────────────────────
    let mut args = std::env::args().skip(1);

    let mut text = "ˈkæt.əp bæd".to_string();
    let mut config = ReplacerConfig::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--text" => {
                if let Some(v) = args.next() {
                    text = v;
                }
            }
            "--config" => {
                if let Some(v) = args.next() {
                    config = ReplacerConfig::from_json(&v)?;
                }
            }
            "--trace" => config.trace_rules = true,
            "--help" => {
                println!("Usage: basic [--text IPA] [--config JSON] [--trace]");
                return Ok(());
            }
            _ => {}
        }
    }

    let inv = Inventory::standard();

    // ── Syllabification ──────────────────────────────────────────────────────
    let utterance = phonorule::tokenize(inv, &text, config.keep_unknown)?;
    println!("input:     {}", text);
    println!("syllables: {}", utterance.syllable_count());
    for p in utterance.phonemes() {
        println!(
            "  {:<3} syllable {} position {}{}",
            p.to_string(),
            p.context.syllable_index,
            p.context.position_in_syllable,
            if p.context.stressed { " (stressed)" } else { "" }
        );
    }

    // ── Rules ────────────────────────────────────────────────────────────────
    let obstruent = FeatureSpec::consonant().obstruent(true);

    let rules = vec![
        SoundSelector::from_spec(inv, obstruent)
            .word_final()
            .update_phonemes(FeatureSpec::new().voiced(false))
            .named("final devoicing"),
        SoundSelector::from_spec(inv, FeatureSpec::consonant().manner(Plosive).voiced(false))
            .start_of_syllable()
            .in_stressed_syllable()
            .update_modifiers(MarkPatch::new().aspirated(true))
            .named("aspiration"),
        SoundSelector::from_spec(inv, FeatureSpec::vowel())
            .in_stressed_syllable()
            .before(SoundSelector::from_spec(inv, FeatureSpec::consonant().voiced(true)))
            .update_modifiers(MarkPatch::new().length(Length::HalfLong))
            .named("pre-voiced lengthening"),
    ];

    let mut current = text.clone();
    for rule in &rules {
        current = phonorule::apply_rule_to_ipa(&current, rule)?;
        println!("{:<24} {}", rule.name().unwrap_or("rule"), current);
    }

    // The same cascade in one call.
    let replacer = Replacer::with_config(rules, config);
    println!("output:    {}", replacer.apply_to_ipa(&text)?);

    Ok(())
}
