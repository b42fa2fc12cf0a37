use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use wud_core::util::hex_upper;
use wud_core::{WudError, load_key};
use wud_disc::{PartitionKind, WudImage, partition};

use crate::cli_types::Cli;
use crate::{CliError, format_bytes};

/// Print the disc header, the partition table and the title keys.
pub(crate) fn run_info(cli: &Cli) -> Result<(), CliError> {
    let common_key = load_key(&cli.common_key)?;
    let disc_key = load_key(&cli.disc_key)?;
    let mut image = WudImage::open(&cli.image, &disc_key)?;

    let header = image.header().clone();
    println!(
        "{}",
        cli.image.display().if_supports_color(Stdout, |t| t.bold())
    );
    println!(
        "  Serial:         {}",
        header.serial.if_supports_color(Stdout, |t| t.cyan())
    );
    println!("  Revision:       {}", header.revision);
    println!("  System version: {}", header.system_version_dotted());
    if header.region.code() == header.region_code {
        println!("  Region:         {}", header.region.name());
    } else {
        println!(
            "  Region:         {} (header field {:?})",
            header.region.name(),
            header.region_code
        );
    }
    if !header.has_magic {
        println!(
            "  {}",
            "Missing WUP- magic".if_supports_color(Stdout, |t| t.yellow())
        );
    }

    let title_keys = image.collect_title_keys(&common_key);

    println!();
    println!("{}:", "Partitions".if_supports_color(Stdout, |t| t.bold()));
    let entries = image.partitions().to_vec();
    for (index, entry) in entries.iter().enumerate() {
        let kind = PartitionKind::from_name(&entry.name);
        let key_source = if title_keys.for_partition(&entry.name).is_some() {
            "title key"
        } else if partition::resolve_key(entry, &title_keys, &disc_key).is_some() {
            "disc key"
        } else {
            "no key"
        };

        let contents = match image.load_partition(index, &title_keys) {
            Ok(p) => format!(
                "{} entries, {}",
                p.total_entries(),
                format_bytes(p.content_size())
            ),
            Err(WudError::MissingKey(_)) => String::new(),
            Err(e) => format!("{}", e.if_supports_color(Stdout, |t| t.red())),
        };

        println!(
            "  {:>2}  {:<20} {:<12} 0x{:010X}  {:<9}  {}",
            index,
            entry.name.if_supports_color(Stdout, |t| t.cyan()),
            kind.to_string(),
            entry.offset,
            key_source,
            contents
        );
    }

    if !title_keys.is_empty() {
        println!();
        println!("{}:", "Title keys".if_supports_color(Stdout, |t| t.bold()));
        for key in title_keys.iter() {
            println!(
                "  {}  {}",
                key.name.if_supports_color(Stdout, |t| t.cyan()),
                hex_upper(&key.decrypted_key).if_supports_color(Stdout, |t| t.dimmed())
            );
        }
    }
    Ok(())
}
