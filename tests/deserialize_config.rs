#[test]
fn empty_config_uses_defaults() {
    let config: inpainter::Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config, inpainter::Config::default());
    assert_eq!(config.canvas.width, 600);
    assert_eq!(config.canvas.height, 400);
    assert_eq!(config.fill.model, "gemini-2.0-flash-exp");
}

#[test]
fn partial_config_keeps_remaining_defaults() {
    let config: inpainter::Config = serde_json::from_str(
        r#"{"brush": {"size": 35.0}, "fill": {"model": "gemini-2.5-flash-image"}}"#,
    )
    .unwrap();
    assert_eq!(config.brush.size, 35.0);
    assert_eq!(
        config.brush.color,
        inpainter::BrushSettings::default().color
    );
    assert_eq!(config.fill.model, "gemini-2.5-flash-image");
    assert_eq!(config.fill.api_key_env, "GEMINI_API_KEY");
    assert_eq!(config.download_file_name, "inpainted-image.png");
}
