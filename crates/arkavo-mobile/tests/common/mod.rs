#![allow(dead_code)]

use arkavo_mobile::device::commands;
use arkavo_mobile::{ChannelCapabilities, DeviceChannel, EngineConfig, MobileError, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// What `getevent` prints while a test runs.
#[derive(Clone)]
pub enum InputEvents {
    /// Stream ends immediately.
    Quiet,
    /// These lines, then the stream ends.
    Lines(Vec<String>),
    /// The same line every 10ms, forever.
    Endless(String),
}

impl InputEvents {
    fn stream(self) -> BoxStream<'static, String> {
        match self {
            InputEvents::Quiet => stream::empty().boxed(),
            InputEvents::Lines(lines) => stream::iter(lines).boxed(),
            InputEvents::Endless(line) => stream::unfold(line, |line| async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Some((line.clone(), line))
            })
            .boxed(),
        }
    }
}

/// Scripted device: answers property and size queries, serves hierarchy dumps from a
/// queue whose last entry repeats, and records every shell command.
pub struct MockChannel {
    device_id: String,
    os_version: String,
    navigation_mode: Option<String>,
    screen: String,
    path_gestures: bool,
    multi_touch: bool,
    input_events: InputEvents,
    hierarchies: Mutex<VecDeque<String>>,
    commands: Mutex<Vec<String>>,
    failing_prefixes: Mutex<Vec<String>>,
    transitions: Mutex<Vec<(String, String)>>,
    unreachable: AtomicBool,
}

impl MockChannel {
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            os_version: "9".to_string(),
            navigation_mode: None,
            screen: "Physical size: 1080x2400".to_string(),
            path_gestures: false,
            multi_touch: false,
            input_events: InputEvents::Quiet,
            hierarchies: Mutex::new(VecDeque::from([app_screen(&[])])),
            commands: Mutex::new(Vec::new()),
            failing_prefixes: Mutex::new(Vec::new()),
            transitions: Mutex::new(Vec::new()),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Android 10 with full gesture navigation.
    pub fn gesture_device(device_id: &str) -> Self {
        Self::new(device_id).with_os("10", Some("2"))
    }

    pub fn with_os(mut self, version: &str, navigation_mode: Option<&str>) -> Self {
        self.os_version = version.to_string();
        self.navigation_mode = navigation_mode.map(str::to_string);
        self
    }

    pub fn with_path_gestures(mut self) -> Self {
        self.path_gestures = true;
        self
    }

    pub fn with_multi_touch(mut self) -> Self {
        self.multi_touch = true;
        self
    }

    pub fn with_input_events(mut self, lines: &[&str]) -> Self {
        self.input_events = InputEvents::Lines(lines.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn with_endless_input_events(mut self, line: &str) -> Self {
        self.input_events = InputEvents::Endless(line.to_string());
        self
    }

    pub fn with_hierarchies(self, dumps: Vec<String>) -> Self {
        *self.hierarchies.lock().unwrap() = dumps.into();
        self
    }

    pub fn with_hierarchy(self, dump: String) -> Self {
        self.with_hierarchies(vec![dump])
    }

    /// Shell commands starting with `prefix` fail as a command error from now on.
    pub fn fail_commands(&self, prefix: &str) {
        self.failing_prefixes.lock().unwrap().push(prefix.to_string());
    }

    /// The first command starting with `prefix` switches the screen to `dump`.
    pub fn on_command(self, prefix: &str, dump: String) -> Self {
        self.transitions.lock().unwrap().push((prefix.to_string(), dump));
        self
    }

    pub fn set_unreachable(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn commands_starting_with(&self, prefix: &str) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn property_queries(&self) -> usize {
        self.commands_starting_with(commands::OS_VERSION).len()
    }

    pub fn taps(&self) -> Vec<String> {
        self.commands_starting_with("input tap")
    }

    pub fn swipes(&self) -> Vec<String> {
        self.commands_starting_with("input swipe")
    }

    pub fn keyevents(&self) -> Vec<String> {
        self.commands_starting_with("input keyevent")
    }

    fn next_hierarchy(&self) -> String {
        let mut queue = self.hierarchies.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        }
    }
}

#[async_trait]
impl DeviceChannel for MockChannel {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            path_gestures: self.path_gestures,
            multi_touch: self.multi_touch,
        }
    }

    async fn shell(&self, command: &str) -> Result<String> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(MobileError::DeviceUnavailable(format!("{} went away", self.device_id)));
        }
        self.commands.lock().unwrap().push(command.to_string());

        {
            let mut transitions = self.transitions.lock().unwrap();
            if let Some(i) = transitions.iter().position(|(prefix, _)| command.starts_with(prefix.as_str())) {
                let (_, dump) = transitions.remove(i);
                *self.hierarchies.lock().unwrap() = VecDeque::from([dump]);
            }
        }

        if self
            .failing_prefixes
            .lock()
            .unwrap()
            .iter()
            .any(|prefix| command.starts_with(prefix.as_str()))
        {
            return Err(MobileError::Command(format!("{} rejected", command)));
        }

        Ok(match command {
            commands::DUMP_HIERARCHY => self.next_hierarchy(),
            commands::SCREEN_SIZE => self.screen.clone(),
            commands::OS_VERSION => self.os_version.clone(),
            commands::SDK_LEVEL => "29".to_string(),
            commands::NAVIGATION_MODE => self
                .navigation_mode
                .clone()
                .unwrap_or_else(|| "null".to_string()),
            _ => String::new(),
        })
    }

    async fn screenshot(&self, destination: &Path) -> Result<()> {
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(destination, b"\x89PNG\r\n\x1a\n")?;
        Ok(())
    }

    async fn input_events(&self) -> Result<BoxStream<'static, String>> {
        Ok(self.input_events.clone().stream())
    }
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        screenshot_dir: std::env::temp_dir().join("arkavo-mobile-tests"),
        ..EngineConfig::default()
    }
}

/// A full-screen app layout with the given extra `<node .../>` lines inside it.
pub fn app_screen(nodes: &[&str]) -> String {
    format!(
        r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?><hierarchy rotation="0">
<node index="0" text="" resource-id="" class="android.widget.FrameLayout" package="com.example" bounds="[0,0][1080,2400]">
{}
</node>
</hierarchy>
UI hierchary dumped to: /dev/tty"#,
        nodes.join("\n")
    )
}

pub fn input_field(focused: bool) -> String {
    format!(
        r#"<node index="0" text="" resource-id="com.example:id/input" class="android.widget.EditText" clickable="true" focused="{}" bounds="[100,200][500,300]" />"#,
        focused
    )
}

/// Legacy three-button navigation bar as drawn by SystemUI.
pub const NAVIGATION_BAR: &str = r#"<node index="1" text="" resource-id="com.android.systemui:id/navigation_bar_frame" class="android.widget.FrameLayout" bounds="[0,2274][1080,2400]">
<node index="0" text="" resource-id="com.android.systemui:id/back" class="android.widget.ImageView" clickable="true" bounds="[100,2274][300,2400]" />
<node index="1" text="" resource-id="com.android.systemui:id/home" class="android.widget.ImageView" clickable="true" bounds="[440,2274][640,2400]" />
<node index="2" text="" resource-id="com.android.systemui:id/recent_apps" class="android.widget.ImageView" clickable="true" bounds="[780,2274][980,2400]" />
</node>"#;

/// Scrollable list whose rows carry the given labels.
pub fn list_with_rows(rows: &[&str]) -> String {
    let rows: Vec<String> = rows
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let top = 200 + i as i32 * 200;
            format!(
                r#"<node index="{}" text="{}" resource-id="com.example:id/row" class="android.widget.TextView" bounds="[0,{}][1080,{}]" />"#,
                i,
                label,
                top,
                top + 200
            )
        })
        .collect();
    format!(
        r#"<node index="0" text="" resource-id="com.example:id/list" class="androidx.recyclerview.widget.RecyclerView" scrollable="true" bounds="[0,200][1080,2000]">
{}
</node>"#,
        rows.join("\n")
    )
}
