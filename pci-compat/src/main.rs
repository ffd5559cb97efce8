use std::{borrow::Cow, io, path::PathBuf, process::ExitCode};

use pci_compat::{EnumeratorBuilder, PciEnumerationError, VendorIdDecoding};
use pci_compat_primitives::hex::parse_hex_u16;
use pci_compat_registry::Registry;

use logger::StderrLogger;

mod logger;

const USAGE: &str = "usage: pci-compat [--vendor=HEX --device=HEX] [--sysfs-root=PATH] [--reference-decoding] [-v|--verbose]...";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct CliOptions {
    vendor_id: Option<u16>,
    device_id: Option<u16>,
    sysfs_root: Option<PathBuf>,
    vendor_id_decoding: VendorIdDecoding,
    verbosity: u8,
    help: bool,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> io::Result<CliOptions> {
    let mut opts = CliOptions::default();

    while let Some(arg) = args.next() {
        let (arg, explicit) = arg
            .split_once("=")
            .map(|(a, b)| (a, Some(b)))
            .unwrap_or((&arg, None));

        match arg {
            "--vendor" => {
                opts.vendor_id = Some(parse_id("--vendor", &require_arg(Some("--vendor"), &mut args, explicit)?)?)
            }
            "--device" => {
                opts.device_id = Some(parse_id("--device", &require_arg(Some("--device"), &mut args, explicit)?)?)
            }
            "--sysfs-root" => {
                opts.sysfs_root = Some(PathBuf::from(
                    require_arg(Some("--sysfs-root"), &mut args, explicit)?.into_owned(),
                ))
            }
            "--reference-decoding" | "--verbose" | "-v" | "--help" | "-h" if explicit.is_some() => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{arg} does not take an argument"),
                ))
            }
            "--reference-decoding" => opts.vendor_id_decoding = VendorIdDecoding::Reference,
            "--verbose" | "-v" => opts.verbosity = opts.verbosity.saturating_add(1),
            "--help" | "-h" => opts.help = true,
            x => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Unrecognized argument {x}"),
                ))
            }
        }
    }

    if opts.vendor_id.is_some() != opts.device_id.is_some() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "--vendor and --device must be given together",
        ));
    }

    Ok(opts)
}

fn parse_id(flag: &str, val: &str) -> io::Result<u16> {
    parse_hex_u16(val).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{flag}: {val} is not a 16-bit hex id ({e})"),
        )
    })
}

fn require_arg<'a, I: Iterator<Item = String>>(
    flag: Option<&str>,
    args: &mut I,
    explicit: Option<&'a str>,
) -> io::Result<Cow<'a, str>> {
    explicit
        .map(Cow::Borrowed)
        .or_else(|| args.next().map(Cow::Owned))
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                if let Some(flag) = flag {
                    format!("{} requires an argument", flag)
                } else {
                    format!("Expected an argument")
                },
            )
        })
}

fn run<R: Registry + Default>(builder: EnumeratorBuilder<R>, opts: &CliOptions) -> io::Result<()> {
    let enumerator = builder.vendor_id_decoding(opts.vendor_id_decoding).build();
    let to_io = |e: PciEnumerationError| io::Error::new(io::ErrorKind::Other, e);

    match (opts.vendor_id, opts.device_id) {
        (Some(vendor_id), Some(device_id)) => match enumerator.by_id(vendor_id, device_id).map_err(to_io)? {
            Some(dev) => println!("{dev}"),
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no device with VID={vendor_id:04x} DID={device_id:04x}"),
                ))
            }
        },
        _ => {
            for dev in enumerator.list().map_err(to_io)? {
                println!("{dev}");
            }
        }
    }

    Ok(())
}

fn real_main<I: Iterator<Item = String>>(args: I) -> io::Result<()> {
    let opts = parse_args(args)?;

    if opts.help {
        println!("{USAGE}");
        return Ok(());
    }

    let env = std::env::var(logger::LOG_ENV).ok();
    StderrLogger::install(logger::raise(logger::base_level(env.as_deref()), opts.verbosity));

    let builder = EnumeratorBuilder::new();

    match &opts.sysfs_root {
        None => run(builder, &opts),
        #[cfg(feature = "sysfs")]
        Some(root) => run(builder.sysfs_root(root.clone()), &opts),
        #[cfg(not(feature = "sysfs"))]
        Some(_) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "--sysfs-root requires feature sysfs to be enabled",
        )),
    }
}

fn main() -> ExitCode {
    let mut args = std::env::args();

    let prg_name = args.next().unwrap_or_else(|| "pci-compat".to_string());

    match real_main(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{prg_name}: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod test {
    use super::{parse_args, run, CliOptions};
    use pci_compat::{EnumeratorBuilder, PciDeviceRecord, VendorIdDecoding};
    use pci_compat_errors::FailureKind;
    use pci_compat_registry::mem::{MemoryEntry, MemoryRegistry};
    use std::io;
    use std::path::PathBuf;

    fn registry() -> MemoryRegistry {
        MemoryRegistry::new()
            .with_entry(MemoryEntry::pci("host", PciDeviceRecord::new(0x8086, 0x1237, 2, 0x060000)))
            .with_entry(MemoryEntry::pci("net", PciDeviceRecord::new(0x1af4, 0x1000, 0, 0x020000)))
    }

    fn by_id(vendor_id: u16, device_id: u16) -> CliOptions {
        CliOptions {
            vendor_id: Some(vendor_id),
            device_id: Some(device_id),
            ..CliOptions::default()
        }
    }

    fn parse(args: &[&str]) -> io::Result<CliOptions> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse(&[]).unwrap(), CliOptions::default());
    }

    #[test]
    fn test_parse_ids_both_forms() {
        let opts = parse(&["--vendor=0x8086", "--device", "1237"]).unwrap();
        assert_eq!(opts.vendor_id, Some(0x8086));
        assert_eq!(opts.device_id, Some(0x1237));
    }

    #[test]
    fn test_parse_flags() {
        let opts = parse(&["-v", "--verbose", "--reference-decoding", "--sysfs-root=/tmp/sys"]).unwrap();
        assert_eq!(opts.verbosity, 2);
        assert_eq!(opts.vendor_id_decoding, VendorIdDecoding::Reference);
        assert_eq!(opts.sysfs_root, Some(PathBuf::from("/tmp/sys")));
    }

    #[test]
    fn test_parse_errors() {
        for args in [
            &["--vendor"][..],
            &["--vendor=zz", "--device=1"],
            &["--vendor=1ffff", "--device=1"],
            &["--vendor=8086"],
            &["--verbose=3"],
            &["--frobnicate"],
        ] {
            assert_eq!(parse(args).unwrap_err().kind(), io::ErrorKind::InvalidInput, "{args:?}");
        }
    }

    #[test]
    fn test_run_lists() {
        assert!(run(EnumeratorBuilder::new().registry(registry()), &CliOptions::default()).is_ok());
    }

    #[test]
    fn test_run_by_id_hit() {
        assert!(run(EnumeratorBuilder::new().registry(registry()), &by_id(0x1af4, 0x1000)).is_ok());
    }

    #[test]
    fn test_run_by_id_miss() {
        let err = run(EnumeratorBuilder::new().registry(registry()), &by_id(0x10de, 0x1000)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_run_registry_failure() {
        let failing = MemoryRegistry::new().fail_with(FailureKind::OsError);
        assert!(run(EnumeratorBuilder::new().registry(failing.clone()), &CliOptions::default()).is_err());
        assert!(run(EnumeratorBuilder::new().registry(failing), &by_id(0x8086, 0x1237)).is_err());
    }
}
