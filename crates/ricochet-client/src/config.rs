use serde::Deserialize;

/// Client configuration, loaded from `ricochet.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// WebSocket endpoint of the game server.
    pub server_url: String,
    /// Channel subscribed for round events.
    pub channel: String,
    /// Room whose game channel to join.
    pub room: String,
    /// Local user id, compared against the server's winner id to decide
    /// whether this client may submit moves.
    pub user_id: String,
    /// Delay between steps when replaying a winning solution.
    pub preview_step_millis: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:3000/cable".to_string(),
            channel: "GameChannel".to_string(),
            room: String::new(),
            user_id: String::new(),
            preview_step_millis: 500,
        }
    }
}

impl ClientConfig {
    /// Load config from `ricochet.toml` if it exists, then apply env var
    /// overrides. An unset user id gets a generated one so winner
    /// comparisons never match by accident.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("ricochet.toml") {
            Ok(content) => match toml::from_str::<ClientConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from ricochet.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse ricochet.toml: {e}, using defaults");
                    ClientConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No ricochet.toml found, using defaults");
                ClientConfig::default()
            },
        };
        config.apply_env_overrides();

        if config.user_id.is_empty() {
            config.user_id = uuid::Uuid::new_v4().to_string();
            tracing::debug!(user_id = %config.user_id, "generated local user id");
        }

        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("RICOCHET_SERVER_URL")
            && !url.is_empty()
        {
            self.server_url = url;
        }
        if let Ok(channel) = std::env::var("RICOCHET_CHANNEL")
            && !channel.is_empty()
        {
            self.channel = channel;
        }
        if let Ok(room) = std::env::var("RICOCHET_ROOM")
            && !room.is_empty()
        {
            self.room = room;
        }
        if let Ok(user_id) = std::env::var("RICOCHET_USER_ID")
            && !user_id.is_empty()
        {
            self.user_id = user_id;
        }
        if let Ok(val) = std::env::var("RICOCHET_PREVIEW_STEP_MS")
            && let Ok(millis) = val.parse::<u64>()
        {
            self.preview_step_millis = millis;
        }
    }

    /// Validate configuration, logging warnings for issues.
    pub fn validate(&self) {
        if self.room.is_empty() {
            tracing::warn!("no room configured, subscribe will target an empty room id");
        }
        if self.preview_step_millis == 0 {
            tracing::warn!("preview_step_millis is 0, solution replays will not animate");
        }
    }
}
