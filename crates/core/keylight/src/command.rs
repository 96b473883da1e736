use crate::cli::KeylightOpt;
use crate::cli::Opt;
use keylight_config::BusKind;
use keylight_config::KeylightConfig;
use keylight_device::Bus;
use keylight_device::BrokerClient;
use keylight_device::Keyboard;
use tracing::info;

/// A command ready to be executed.
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// What the command does, completing "failed to ...".
    fn description(&self) -> String;

    async fn execute(&self) -> anyhow::Result<()>;
}

pub trait BuildCommand {
    fn build_command(self, context: BuildContext) -> Box<dyn Command>;
}

pub struct BuildContext {
    pub keyboard: Keyboard,
}

impl BuildContext {
    pub fn new(opt: &Opt, config: &KeylightConfig) -> Self {
        let device = opt.device.clone().unwrap_or_else(|| config.device.path.clone());
        let bus = if opt.session || config.broker.bus == BusKind::Session {
            Bus::Session
        } else {
            Bus::System
        };
        BuildContext {
            keyboard: Keyboard::new(device, BrokerClient::new(bus)),
        }
    }
}

impl BuildCommand for KeylightOpt {
    fn build_command(self, context: BuildContext) -> Box<dyn Command> {
        let keyboard = context.keyboard;
        match self {
            KeylightOpt::Brightness { percent: None } => Box::new(ShowBrightness { keyboard }),
            KeylightOpt::Brightness {
                percent: Some(percent),
            } => Box::new(SetBrightness { keyboard, percent }),
            KeylightOpt::Color { value: None, .. } => Box::new(ShowColors { keyboard }),
            KeylightOpt::Color {
                value: Some(value),
                zone,
            } => Box::new(SetColor {
                keyboard,
                value,
                zone,
            }),
            KeylightOpt::Zones => Box::new(ListZones { keyboard }),
            KeylightOpt::Info => Box::new(ShowInfo { keyboard }),
        }
    }
}

struct ShowBrightness {
    keyboard: Keyboard,
}

#[async_trait::async_trait]
impl Command for ShowBrightness {
    fn description(&self) -> String {
        format!("read the brightness of {}", self.keyboard.path())
    }

    async fn execute(&self) -> anyhow::Result<()> {
        println!("{}", self.keyboard.brightness()?);
        Ok(())
    }
}

struct SetBrightness {
    keyboard: Keyboard,
    percent: i64,
}

#[async_trait::async_trait]
impl Command for SetBrightness {
    fn description(&self) -> String {
        format!("set the brightness of {}", self.keyboard.path())
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let raw = self.keyboard.set_brightness(self.percent).await?;
        info!(percent = self.percent, raw, "Brightness updated");
        Ok(())
    }
}

struct ShowColors {
    keyboard: Keyboard,
}

#[async_trait::async_trait]
impl Command for ShowColors {
    fn description(&self) -> String {
        format!("read the zone colors of {}", self.keyboard.path())
    }

    async fn execute(&self) -> anyhow::Result<()> {
        for zone in self.keyboard.zones()? {
            println!("{}: {}", zone.id(), zone.color()?);
        }
        Ok(())
    }
}

struct SetColor {
    keyboard: Keyboard,
    value: String,
    zone: Option<String>,
}

#[async_trait::async_trait]
impl Command for SetColor {
    fn description(&self) -> String {
        match &self.zone {
            Some(zone) => format!("set the color of zone '{zone}'"),
            None => format!("set the color of {}", self.keyboard.path()),
        }
    }

    async fn execute(&self) -> anyhow::Result<()> {
        match &self.zone {
            Some(zone) => self.keyboard.zone(zone)?.set_color(&self.value).await?,
            None => self.keyboard.set_color(&self.value).await?,
        }
        info!(color = %self.value, zone = ?self.zone, "Color updated");
        Ok(())
    }
}

struct ListZones {
    keyboard: Keyboard,
}

#[async_trait::async_trait]
impl Command for ListZones {
    fn description(&self) -> String {
        format!("list the zones of {}", self.keyboard.path())
    }

    async fn execute(&self) -> anyhow::Result<()> {
        for zone in self.keyboard.zones()? {
            println!("{}", zone.id());
        }
        Ok(())
    }
}

struct ShowInfo {
    keyboard: Keyboard,
}

#[async_trait::async_trait]
impl Command for ShowInfo {
    fn description(&self) -> String {
        format!("describe {}", self.keyboard.path())
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let keyboard = &self.keyboard;
        let profile = keyboard.profile();
        let max = keyboard.max_brightness()?;
        let raw = keyboard.raw_brightness()?;

        println!("path: {}", keyboard.path());
        println!("kind: {}", profile.kind);
        println!("color format: {}", profile.color_format);
        println!("max brightness: {max}");
        println!("brightness: {raw} ({}%)", keyboard.brightness()?);
        println!("zones: {}", keyboard.zones()?.len());
        Ok(())
    }
}
