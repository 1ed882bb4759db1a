use anyhow::{Context, bail};
use arkavo_mobile::device::DeviceProperties;
use arkavo_mobile::{
    AdbChannel, DeviceChannel, EngineConfig, MobileEngine, NavigationAction, TapAction,
    TargetDescriptor,
};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: arkavo-mobile-probe [-s SERIAL] <command>

commands:
  devices                 list connected devices
  props                   OS version and navigation mode
  observe [--screenshot]  capture the screen and print the snapshot
  tap <resource-id|x,y>   tap an element or a point
  home | recents | back   system navigation
  button <name>           press a hardware button";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries JSON only.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let serial = match args.iter().position(|a| a == "-s") {
        Some(i) if i + 1 < args.len() => {
            let serial = args.remove(i + 1);
            args.remove(i);
            Some(serial)
        }
        Some(_) => bail!("-s needs a serial\n\n{}", USAGE),
        None => None,
    };
    let Some(command) = args.first().cloned() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let config = EngineConfig::from_env().context("reading ARKAVO_* configuration")?;

    if command == "devices" {
        let devices = AdbChannel::list_devices(&config.adb_path).await?;
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    let serial = match serial {
        Some(serial) => serial,
        None => AdbChannel::list_devices(&config.adb_path)
            .await?
            .into_iter()
            .next()
            .context("no device connected; pass -s SERIAL")?,
    };
    tracing::info!(device = %serial, command = %command, "probe");

    let result = match command.as_str() {
        "props" => {
            let channel = AdbChannel::new(config.adb_path.clone(), serial);
            let properties = DeviceProperties::query(&channel as &dyn DeviceChannel).await?;
            println!("{}", serde_json::to_string_pretty(&properties)?);
            println!("gesture_navigation: {}", properties.gesture_navigation());
            return Ok(());
        }
        "observe" => {
            MobileEngine::connect(config, serial)
                .observe(args.iter().any(|a| a == "--screenshot")).await?
        }
        "tap" => {
            let raw = args.get(1).context("tap needs a resource id or x,y")?;
            let target = match raw.split_once(',') {
                Some((x, y)) => TargetDescriptor::point(x.trim().parse()?, y.trim().parse()?),
                None => TargetDescriptor::resource_id(raw.as_str()),
            };
            MobileEngine::connect(config, serial)
                .tap_on(&target, TapAction::Tap, None)
                .await?
        }
        "home" => MobileEngine::connect(config, serial).navigate(NavigationAction::Home).await?,
        "recents" => MobileEngine::connect(config, serial).navigate(NavigationAction::RecentApps).await?,
        "back" => MobileEngine::connect(config, serial).navigate(NavigationAction::Back).await?,
        "button" => {
            let name = args.get(1).context("button needs a name")?;
            MobileEngine::connect(config, serial).press_button(name).await?
        }
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    };

    println!("{}", serde_json::to_string_pretty(&result.to_json())?);
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
