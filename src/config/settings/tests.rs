use super::*;
use tempfile::TempDir;

#[test]
fn defaults_when_no_config_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load_from(temp_dir.path()).expect("should load defaults");

    assert_eq!(config.gemini, GeminiConfig::default());
    assert_eq!(config.chunking.max_chunk_chars, 1000);
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.base_dir, temp_dir.path());
}

#[test]
fn save_and_reload_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut config = Config::load_from(temp_dir.path()).expect("should load defaults");
    config.gemini.api_key = "key-123".to_string();
    config.chunking.max_chunk_chars = 500;
    config.retrieval.top_k = 8;
    config.save().expect("should save");

    let reloaded = Config::load_from(temp_dir.path()).expect("should reload");
    assert_eq!(reloaded.gemini.api_key, "key-123");
    assert_eq!(reloaded.chunking.max_chunk_chars, 500);
    assert_eq!(reloaded.retrieval.top_k, 8);
}

#[test]
fn invalid_chunk_budget_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut config = Config::load_from(temp_dir.path()).expect("should load defaults");
    config.chunking.max_chunk_chars = 5;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidChunkBudget(5))
    ));
    assert!(config.save().is_err());
}

#[test]
fn invalid_top_k_rejected() {
    let mut config = Config {
        gemini: GeminiConfig::default(),
        chunking: ChunkingConfig::default(),
        retrieval: RetrievalConfig { top_k: 0 },
        base_dir: PathBuf::new(),
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidTopK(0))
    ));

    config.retrieval.top_k = 101;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidTopK(101))
    ));
}

#[test]
fn gemini_validation() {
    let mut gemini = GeminiConfig::default();
    assert!(gemini.validate().is_ok());

    gemini.endpoint = "not a url".to_string();
    assert!(matches!(
        gemini.validate(),
        Err(ConfigError::InvalidEndpoint(_))
    ));

    gemini = GeminiConfig {
        embedding_model: "  ".to_string(),
        ..GeminiConfig::default()
    };
    assert!(matches!(
        gemini.validate(),
        Err(ConfigError::InvalidModel(_))
    ));

    gemini = GeminiConfig {
        embedding_dimension: 32,
        ..GeminiConfig::default()
    };
    assert!(matches!(
        gemini.validate(),
        Err(ConfigError::InvalidEmbeddingDimension(32))
    ));
}

#[test]
fn api_key_from_config_takes_priority() {
    let gemini = GeminiConfig {
        api_key: "from-config".to_string(),
        ..GeminiConfig::default()
    };

    let key = gemini.resolve_api_key().expect("should resolve");
    assert_eq!(key, "from-config");
}

#[test]
fn paths_derive_from_base_dir() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config::load_from(temp_dir.path()).expect("should load defaults");

    assert_eq!(config.config_file_path(), temp_dir.path().join("config.toml"));
    assert_eq!(config.vector_db_path(), temp_dir.path().join("vector_db"));
}

#[test]
fn malformed_toml_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(temp_dir.path().join("config.toml"), "gemini = nonsense[")
        .expect("should write file");

    assert!(Config::load_from(temp_dir.path()).is_err());
}
