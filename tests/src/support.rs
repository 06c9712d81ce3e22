use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::sync::{Mutex, MutexGuard};

/// Serializes stub creation and execution.
///
/// Writing an executable while another test forks can leave the write handle
/// open in the child, and exec then fails with ETXTBSY.
static SCRIPT_LOCK: Mutex<()> = Mutex::const_new(());

pub async fn exclusive() -> MutexGuard<'static, ()> {
    SCRIPT_LOCK.lock().await
}

/// A shell script standing in for the scanning executable.
pub struct StubTool {
    dir: TempDir,
    path: PathBuf,
}

impl StubTool {
    /// A stub that answers `--version` and runs `body` for a scan. The scan
    /// arguments are recorded one per line in `args`.
    pub fn new(body: &str) -> Self {
        let dir: TempDir = TempDir::new().unwrap();
        let args_file: PathBuf = dir.path().join("args");
        let script: String = format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"--version\" ]; then\n\
             \techo 'Nmap version 7.94 ( https://nmap.org )'\n\
             \texit 0\n\
             fi\n\
             printf '%s\\n' \"$@\" > '{}'\n\
             {}\n",
            args_file.display(),
            body.replace("{dir}", &dir.path().display().to_string()),
        );
        Self::from_script(dir, &script)
    }

    /// A stub whose version probe fails.
    pub fn broken() -> Self {
        let dir: TempDir = TempDir::new().unwrap();
        Self::from_script(dir, "#!/bin/sh\necho 'segmentation fault' >&2\nexit 139\n")
    }

    fn from_script(dir: TempDir, script: &str) -> Self {
        let path: PathBuf = dir.path().join("nmap");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Arguments of the last scan, or `None` if no scan ran.
    pub fn recorded_args(&self) -> Option<Vec<String>> {
        let text: String = fs::read_to_string(self.file("args")).ok()?;
        Some(text.lines().map(str::to_string).collect())
    }
}

/// Whether `pid` is a live (non-zombie) process.
#[cfg(target_os = "linux")]
pub fn is_alive(pid: u32) -> bool {
    match fs::read_to_string(format!("/proc/{pid}/stat")) {
        Err(_) => false,
        Ok(stat) => stat
            .rsplit(')')
            .next()
            .and_then(|rest| rest.trim_start().chars().next())
            .is_some_and(|state| state != 'Z'),
    }
}

/// Waits for the pid file a stub writes once its child is running.
pub async fn wait_for_pid(path: &Path) -> u32 {
    for _ in 0..500 {
        if let Ok(text) = fs::read_to_string(path)
            && let Ok(pid) = text.trim().parse()
        {
            return pid;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("stub never wrote {}", path.display());
}

pub const ONE_HOST_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<nmaprun scanner="nmap" version="7.94" xmloutputversion="1.05">
<host><status state="up" reason="arp-response"/>
<address addr="192.168.50.10" addrtype="ipv4"/>
<address addr="AA:BB:CC:DD:EE:01" addrtype="mac"/>
<ports>
<port protocol="tcp" portid="22"><state state="open"/><service name="ssh"/></port>
<port protocol="tcp" portid="80"><state state="closed"/><service name="http"/></port>
</ports>
<os><osmatch name="Linux 5.0 - 5.14" accuracy="98"/></os>
</host>
<runstats><finished exit="success"/><hosts up="1" down="255" total="256"/></runstats>
</nmaprun>"#;

pub const NO_HOSTS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nmaprun scanner="nmap" version="7.94">
<runstats><finished exit="success"/><hosts up="0" down="1" total="1"/></runstats>
</nmaprun>"#;

/// Shell body that prints `xml` on stdout.
pub fn print_document(xml: &str) -> String {
    format!("cat <<'NMAP_XML'\n{xml}\nNMAP_XML")
}
