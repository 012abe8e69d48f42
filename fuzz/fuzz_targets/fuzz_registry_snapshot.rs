#![no_main]

use libfuzzer_sys::fuzz_target;

use quorate_governance::TemplateRegistry;

// Registry snapshots come from disk or from an auditor; decoding must never
// panic, and anything that loads must save and load again unchanged.
fuzz_target!(|data: &[u8]| {
    let Ok(registry) = TemplateRegistry::load_state(data) else {
        return;
    };
    let bytes = registry.save_state().unwrap();
    let reloaded = TemplateRegistry::load_state(&bytes).unwrap();
    assert_eq!(reloaded.template_ids(), registry.template_ids());
    for id in registry.template_ids() {
        let template = registry.get_template(id).unwrap();
        assert!(template.min_voting_duration_secs <= template.max_voting_duration_secs);
        assert!(template.min_start_delay_secs <= template.max_start_delay_secs);
        assert_eq!(reloaded.get_template(id), Some(template));
    }
});
