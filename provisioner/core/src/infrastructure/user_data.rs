// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! User Data Renderer
//!
//! `BootScriptSink` producing first-boot user data for launched instances.
//! Linux instances get a bash script, Windows instances a PowerShell block.
//! Downloads are fetched from the bucket to a deterministic local path
//! derived from the object key.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Render the boot script handed to the instance at launch

use crate::domain::artifact::ArtifactLocation;
use crate::domain::boot_script::{BootScriptError, BootScriptSink};
use crate::domain::instance::OperatingSystemKind;
use parking_lot::Mutex;
use tracing::debug;

const LINUX_DOWNLOAD_DIR: &str = "/tmp";
const WINDOWS_DOWNLOAD_DIR: &str = "C:/temp";

#[derive(Default)]
struct Script {
    lines: Vec<String>,
    sealed: bool,
}

pub struct UserData {
    os: OperatingSystemKind,
    script: Mutex<Script>,
}

impl UserData {
    pub fn for_os(os: OperatingSystemKind) -> Self {
        Self {
            os,
            script: Mutex::new(Script::default()),
        }
    }

    pub fn for_linux() -> Self {
        Self::for_os(OperatingSystemKind::Linux)
    }

    pub fn for_windows() -> Self {
        Self::for_os(OperatingSystemKind::Windows)
    }

    pub fn os(&self) -> OperatingSystemKind {
        self.os
    }

    /// Lines appended so far, without the platform wrapper
    pub fn lines(&self) -> Vec<String> {
        self.script.lock().lines.clone()
    }

    /// Stop accepting commands
    pub fn seal(&self) {
        self.script.lock().sealed = true;
    }

    /// Full user data document
    pub fn render(&self) -> String {
        let script = self.script.lock();
        match self.os {
            OperatingSystemKind::Windows => {
                let mut out = String::from("<powershell>");
                for line in &script.lines {
                    out.push('\n');
                    out.push_str(line);
                }
                out.push_str("\n</powershell>");
                out
            }
            _ => {
                let mut out = String::from("#!/bin/bash");
                for line in &script.lines {
                    out.push('\n');
                    out.push_str(line);
                }
                out
            }
        }
    }

    fn append(&self, lines: impl IntoIterator<Item = String>) -> Result<(), BootScriptError> {
        let mut script = self.script.lock();
        if script.sealed {
            return Err(BootScriptError::Sealed);
        }
        script.lines.extend(lines);
        Ok(())
    }
}

impl BootScriptSink for UserData {
    fn add_download_command(&self, source: &ArtifactLocation) -> Result<String, BootScriptError> {
        let (local_path, commands) = match self.os {
            OperatingSystemKind::Linux => {
                let local_path = format!("{}/{}", LINUX_DOWNLOAD_DIR, source.object_key);
                let commands = vec![
                    format!("mkdir -p $(dirname '{}')", local_path),
                    format!("aws s3 cp '{}' '{}'", source.to_uri(), local_path),
                ];
                (local_path, commands)
            }
            OperatingSystemKind::Windows => {
                let local_path = format!("{}/{}", WINDOWS_DOWNLOAD_DIR, source.object_key);
                let commands = vec![
                    format!("mkdir (Split-Path -Path '{}' ) -ea 0", local_path),
                    format!(
                        "Read-S3Object -BucketName '{}' -key '{}' -file '{}' -ErrorAction Stop",
                        source.bucket, source.object_key, local_path
                    ),
                ];
                (local_path, commands)
            }
            OperatingSystemKind::Unknown => {
                return Err(BootScriptError::Rejected(format!(
                    "no download command for {} instances",
                    self.os
                )));
            }
        };

        self.append(commands)?;
        debug!("Scheduled download of {} to {}", source.to_uri(), local_path);
        Ok(local_path)
    }

    fn add_commands(&self, lines: &[String]) -> Result<(), BootScriptError> {
        self.append(lines.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> ArtifactLocation {
        ArtifactLocation::new("assets", "abc.zip")
    }

    #[test]
    fn test_linux_download() {
        let user_data = UserData::for_linux();
        let path = user_data.add_download_command(&location()).unwrap();

        assert_eq!(path, "/tmp/abc.zip");
        assert_eq!(
            user_data.render(),
            "#!/bin/bash\n\
             mkdir -p $(dirname '/tmp/abc.zip')\n\
             aws s3 cp 's3://assets/abc.zip' '/tmp/abc.zip'"
        );
    }

    #[test]
    fn test_windows_download() {
        let user_data = UserData::for_windows();
        let path = user_data.add_download_command(&location()).unwrap();
        user_data.add_commands(&["Write-Host done".to_string()]).unwrap();

        assert_eq!(path, "C:/temp/abc.zip");
        assert_eq!(
            user_data.render(),
            "<powershell>\n\
             mkdir (Split-Path -Path 'C:/temp/abc.zip' ) -ea 0\n\
             Read-S3Object -BucketName 'assets' -key 'abc.zip' -file 'C:/temp/abc.zip' -ErrorAction Stop\n\
             Write-Host done\n\
             </powershell>"
        );
    }

    #[test]
    fn test_commands_keep_order() {
        let user_data = UserData::for_linux();
        user_data
            .add_commands(&["echo one".to_string(), "echo two".to_string()])
            .unwrap();
        user_data.add_commands(&["echo three".to_string()]).unwrap();

        assert_eq!(user_data.lines(), vec!["echo one", "echo two", "echo three"]);
    }

    #[test]
    fn test_sealed_rejects_commands() {
        let user_data = UserData::for_linux();
        user_data.seal();

        assert!(matches!(
            user_data.add_commands(&["echo late".to_string()]),
            Err(BootScriptError::Sealed)
        ));
    }

    #[test]
    fn test_unknown_platform_cannot_download() {
        let user_data = UserData::for_os(OperatingSystemKind::Unknown);
        assert!(matches!(
            user_data.add_download_command(&location()),
            Err(BootScriptError::Rejected(_))
        ));
        assert!(user_data.lines().is_empty());
    }
}
