use dimlink_frame::{DEFAULT_PAYLOAD_LEN, MIN_FRAME_SIZE};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("dimlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: dimlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("DIMLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("DIMLINK_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "protocol: frame={} bytes, payload={} bytes",
        MIN_FRAME_SIZE + DEFAULT_PAYLOAD_LEN,
        DEFAULT_PAYLOAD_LEN
    );
    println!("features: async={}, cli=true", cfg!(feature = "async"));

    Ok(SUCCESS)
}
