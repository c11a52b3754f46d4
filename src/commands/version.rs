use std::env;

use crate::app_info::AppInfo;

pub fn print_version_info(app: AppInfo) {
    let core = AppInfo::vigil();

    let git_hash = option_env!("GIT_HASH").unwrap_or("unknown");
    let build_timestamp = option_env!("BUILD_TIMESTAMP").unwrap_or("unknown");

    println!("📦 {} v{}", app.name, app.version);

    if !app.description.is_empty() {
        println!("📝 {}", app.description);
    }

    if app.name != core.name {
        println!("🧱 Uses {} v{}", core.name, core.version);
    }

    println!();
    println!("🔨 Build Information:");
    println!("  🔗 Git Hash: {git_hash}");
    println!("  ⏰ Build Time: {build_timestamp}");
    println!();
    println!("💻 Runtime Information:");
    println!("  🖥️  OS: {}", env::consts::OS);
    println!("  🏗️  Architecture: {}", env::consts::ARCH);
}
