//! Shared constants for test infrastructure

pub const OWNER: &str = "acme";
pub const SELF_REPO: &str = "mcp-server";
pub const PLUGIN_REPO: &str = "plugins";

pub const TAG_V1_0_0: &str = "v1.0.0";
pub const TAG_V1_1_0: &str = "v1.1.0";
pub const TAG_V1_2_0: &str = "v1.2.0";

pub const WINDOWS_BUNDLE: &str = "mcp-server-windows.zip";
pub const LINUX_BUNDLE: &str = "mcp-server-linux.zip";

pub const PUBLISHED_AT: &str = "2024-05-01T10:00:00Z";

pub const FAKE_BUNDLE_CONTENT: &[u8] = b"fake bundle content for testing";

pub fn self_repo_url() -> String {
    format!("https://github.com/{}/{}", OWNER, SELF_REPO)
}

pub fn plugin_repo_url() -> String {
    format!("https://github.com/{}/{}", OWNER, PLUGIN_REPO)
}
