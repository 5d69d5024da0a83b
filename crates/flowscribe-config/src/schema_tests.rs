use super::*;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.renderer.endpoint, "http://localhost:9222");
    assert_eq!(config.renderer.call_timeout_secs, 30);
    assert!(config.extraction.editor_url.is_empty());
    assert!(!config.extraction.save_empty_workflows);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_default_canvas_band() {
    let canvas = CanvasConfig::default();
    assert_eq!(canvas.min_x, 250.0);
    assert!(canvas.max_x.is_none());
}

#[test]
fn test_default_selectors() {
    let selectors = SelectorConfig::default();
    assert_eq!(selectors.step_pattern, r"^Step\s+\d+");
    assert_eq!(selectors.wf_item_attribute, "data-wf-item");
    assert!(selectors.panel.contains("inspector"));
}

#[test]
fn test_timing_durations() {
    let timing = TimingConfig::default();
    assert_eq!(timing.click_settle(), Duration::from_millis(1000));
    assert!(timing.retry_settle() > timing.click_settle());
    assert_eq!(TimingConfig::immediate().navigation_settle(), Duration::ZERO);
}

#[test]
fn test_partial_section_keeps_field_defaults() {
    let config: Config = toml::from_str(
        r#"
        [extraction.canvas]
        max_x = 1800.0
        "#,
    )
    .unwrap();
    assert_eq!(config.extraction.canvas.min_x, 250.0);
    assert_eq!(config.extraction.canvas.max_x, Some(1800.0));
    assert_eq!(config.extraction.timing.selection_settle_ms, 2000);
}

#[test]
fn test_output_root_default_is_absolute_or_tmp() {
    let output = OutputConfig::default();
    assert!(output.root_dir.ends_with("snapshots"));
}
