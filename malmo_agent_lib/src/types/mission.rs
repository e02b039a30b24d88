use eyre::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

/// Declarative mission document handed to the platform once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    pub summary: String,
    pub server: ServerConfig,
    pub agent: AgentSectionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// World time in ticks at mission start (12000 is dusk).
    pub start_time: u32,
    pub allow_passage_of_time: bool,
    pub flat_world_generator: String,
    pub cuboids: Vec<Cuboid>,
    /// Ends the mission after this many milliseconds when set.
    pub time_limit_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cuboid {
    pub from: [i32; 3],
    pub to: [i32; 3],
    pub block: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSectionConfig {
    pub name: String,
    pub mode: GameMode,
    pub placement: Placement,
    pub handlers: HandlerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub pitch: f64,
    #[serde(default)]
    pub yaw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    pub observation_from_full_stats: bool,
    /// Turn speed for continuous movement, `None` disables the handler.
    pub continuous_movement_turn_speed_degs: Option<u32>,
    pub video: Option<VideoProducerConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoProducerConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub want_depth: bool,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            summary: "Simple Env".to_string(),
            server: ServerConfig::default(),
            agent: AgentSectionConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            start_time: 12000,
            allow_passage_of_time: false,
            flat_world_generator: "3;7,220*1,5*3,2;3;,biome_1".to_string(),
            cuboids: vec![
                Cuboid {
                    from: [-1072, 227, 5],
                    to: [-1059, 227, 5],
                    block: "quartz_block".to_string(),
                },
                Cuboid {
                    from: [-1065, 227, 35],
                    to: [-1059, 237, 35],
                    block: "gold_block".to_string(),
                },
            ],
            time_limit_ms: None,
        }
    }
}

impl Default for AgentSectionConfig {
    fn default() -> Self {
        Self {
            name: "SelfMod".to_string(),
            mode: GameMode::Creative,
            placement: Placement {
                x: -1065.5,
                y: 346.5,
                z: -1.5,
                pitch: 0.0,
                yaw: 0.0,
            },
            handlers: HandlerConfig::default(),
        }
    }
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            observation_from_full_stats: true,
            continuous_movement_turn_speed_degs: Some(180),
            video: Some(VideoProducerConfig {
                width: 1344,
                height: 540,
                want_depth: false,
            }),
        }
    }
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Survival => "Survival",
            GameMode::Creative => "Creative",
            GameMode::Adventure => "Adventure",
            GameMode::Spectator => "Spectator",
        }
    }
}

impl MissionConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: MissionConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.agent.name.trim().is_empty() {
            return Err(eyre::eyre!("Agent name must not be empty"));
        }

        if let Some(video) = &self.agent.handlers.video {
            if video.width == 0 || video.height == 0 {
                return Err(eyre::eyre!(
                    "Video producer size must be non-zero (got {}x{})",
                    video.width,
                    video.height
                ));
            }
        }

        if self.server.flat_world_generator.trim().is_empty() {
            return Err(eyre::eyre!("Flat world generator string must not be empty"));
        }

        for cuboid in &self.server.cuboids {
            if cuboid.block.trim().is_empty() {
                return Err(eyre::eyre!(
                    "Cuboid {:?}..{:?} has no block type",
                    cuboid.from,
                    cuboid.to
                ));
            }
        }

        Ok(())
    }

    /// Render the mission in the platform's XML schema.
    pub fn to_mission_xml(&self) -> String {
        let server = &self.server;
        let agent = &self.agent;
        let mut xml = String::new();

        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\" ?>\n");
        xml.push_str("<Mission xmlns=\"http://ProjectMalmo.microsoft.com\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\n");

        let _ = writeln!(xml, "  <About>");
        let _ = writeln!(xml, "    <Summary>{}</Summary>", escape_xml(&self.summary));
        let _ = writeln!(xml, "  </About>");

        let _ = writeln!(xml, "  <ServerSection>");
        let _ = writeln!(xml, "    <ServerInitialConditions>");
        let _ = writeln!(xml, "      <Time>");
        let _ = writeln!(xml, "        <StartTime>{}</StartTime>", server.start_time);
        let _ = writeln!(
            xml,
            "        <AllowPassageOfTime>{}</AllowPassageOfTime>",
            server.allow_passage_of_time
        );
        let _ = writeln!(xml, "      </Time>");
        let _ = writeln!(xml, "    </ServerInitialConditions>");
        let _ = writeln!(xml, "    <ServerHandlers>");
        let _ = writeln!(
            xml,
            "      <FlatWorldGenerator generatorString=\"{}\"/>",
            escape_xml(&server.flat_world_generator)
        );
        if !server.cuboids.is_empty() {
            let _ = writeln!(xml, "      <DrawingDecorator>");
            for c in &server.cuboids {
                let _ = writeln!(
                    xml,
                    "        <DrawCuboid x1=\"{}\" y1=\"{}\" z1=\"{}\" x2=\"{}\" y2=\"{}\" z2=\"{}\" type=\"{}\"/>",
                    c.from[0],
                    c.from[1],
                    c.from[2],
                    c.to[0],
                    c.to[1],
                    c.to[2],
                    escape_xml(&c.block)
                );
            }
            let _ = writeln!(xml, "      </DrawingDecorator>");
        }
        if let Some(limit) = server.time_limit_ms {
            let _ = writeln!(xml, "      <ServerQuitFromTimeUp timeLimitMs=\"{}\"/>", limit);
        }
        let _ = writeln!(xml, "    </ServerHandlers>");
        let _ = writeln!(xml, "  </ServerSection>");

        let _ = writeln!(xml, "  <AgentSection mode=\"{}\">", agent.mode.as_str());
        let _ = writeln!(xml, "    <Name>{}</Name>", escape_xml(&agent.name));
        let _ = writeln!(xml, "    <AgentStart>");
        let p = &agent.placement;
        let _ = writeln!(
            xml,
            "      <Placement x=\"{}\" y=\"{}\" z=\"{}\" pitch=\"{}\" yaw=\"{}\"/>",
            p.x, p.y, p.z, p.pitch, p.yaw
        );
        let _ = writeln!(xml, "      <Inventory/>");
        let _ = writeln!(xml, "    </AgentStart>");
        let _ = writeln!(xml, "    <AgentHandlers>");
        let h = &agent.handlers;
        if h.observation_from_full_stats {
            let _ = writeln!(xml, "      <ObservationFromFullStats/>");
        }
        if let Some(turn_speed) = h.continuous_movement_turn_speed_degs {
            let _ = writeln!(
                xml,
                "      <ContinuousMovementCommands turnSpeedDegs=\"{}\"/>",
                turn_speed
            );
        }
        if let Some(video) = &h.video {
            let _ = writeln!(
                xml,
                "      <VideoProducer want_depth=\"{}\">",
                video.want_depth
            );
            let _ = writeln!(xml, "        <Width>{}</Width>", video.width);
            let _ = writeln!(xml, "        <Height>{}</Height>", video.height);
            let _ = writeln!(xml, "      </VideoProducer>");
        }
        let _ = writeln!(xml, "    </AgentHandlers>");
        let _ = writeln!(xml, "  </AgentSection>");
        xml.push_str("</Mission>\n");

        xml
    }
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Recording settings passed alongside the mission. The driver never records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSpec {
    pub destination: Option<PathBuf>,
    pub record_observations: bool,
    pub record_commands: bool,
    pub record_video: bool,
}

impl RecordSpec {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.destination.is_some()
    }
}
