use clap::{App, Arg, SubCommand};
use songprint::catalog::index::AddOutcome;
use songprint::{Config, MatchOutput, OutputFormat, SongPrint};
use std::process;

fn main() {
    let matches = App::new("SongPrint CLI")
        .version(songprint::VERSION)
        .about("An offline audio fingerprinting tool: enroll songs into a local catalog, then recognize clips against it")
        .subcommand(
            SubCommand::with_name("add")
                .about("Enroll one or more audio files into the catalog")
                .arg(
                    Arg::with_name("files")
                        .required(true)
                        .multiple(true)
                        .help("Audio file paths to enroll")
                )
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .value_name("NAME")
                        .help("Song name (single file only; defaults to the file basename)")
                        .takes_value(true)
                )
                .arg(
                    Arg::with_name("artist")
                        .short("a")
                        .long("artist")
                        .value_name("ARTIST")
                        .help("Artist name (single file only)")
                        .takes_value(true)
                )
                .arg(catalog_arg())
                .arg(verbose_arg())
        )
        .subcommand(
            SubCommand::with_name("remove")
                .about("Remove a song from the catalog by its exact label")
                .arg(
                    Arg::with_name("name")
                        .required(true)
                        .help("Song name")
                        .index(1)
                )
                .arg(
                    Arg::with_name("artist")
                        .short("a")
                        .long("artist")
                        .value_name("ARTIST")
                        .help("Artist name")
                        .takes_value(true)
                )
                .arg(catalog_arg())
                .arg(verbose_arg())
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("List the songs in the catalog")
                .arg(catalog_arg())
        )
        .subcommand(
            SubCommand::with_name("recognize")
                .about("Recognize a song from an audio file")
                .arg(
                    Arg::with_name("input")
                        .required(true)
                        .help("Input audio file path")
                        .index(1)
                )
                .arg(format_arg())
                .arg(catalog_arg())
                .arg(verbose_arg())
        )
        .subcommand(
            SubCommand::with_name("listen")
                .about("Record from a microphone for a fixed duration, then recognize")
                .arg(
                    Arg::with_name("duration")
                        .short("t")
                        .long("duration")
                        .value_name("SECONDS")
                        .help("Recording duration in seconds")
                        .takes_value(true)
                        .default_value("10")
                )
                .arg(
                    Arg::with_name("device")
                        .short("d")
                        .long("device")
                        .value_name("DEVICE")
                        .help("Audio input device name")
                        .takes_value(true)
                )
                .arg(format_arg())
                .arg(catalog_arg())
                .arg(verbose_arg())
        )
        .subcommand(
            SubCommand::with_name("devices")
                .about("List available audio input devices")
        )
        .get_matches();

    match matches.subcommand() {
        ("add", Some(sub_matches)) => {
            let files: Vec<&str> = sub_matches.values_of("files").unwrap().collect();
            let name = sub_matches.value_of("name");
            let artist = sub_matches.value_of("artist");

            if files.len() > 1 && name.is_some() {
                eprintln!("Error: --name can only be used with a single file");
                process::exit(1);
            }

            let mut songprint = songprint_for(sub_matches);
            let mut enrolled = 0;

            for file in &files {
                match songprint.enroll_from_file(file, name, artist) {
                    Ok(AddOutcome::Added(song_id)) => {
                        println!("Enrolled {} as song {}", file, song_id);
                        enrolled += 1;
                    }
                    Ok(AddOutcome::AlreadyPresent) => {
                        eprintln!("{} already in the catalog, skipping", file);
                    }
                    Err(e) => {
                        eprintln!("Error enrolling {}: {}", file, e);
                    }
                }
            }

            if enrolled > 0 {
                if let Err(e) = songprint.save() {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        ("remove", Some(sub_matches)) => {
            let name = sub_matches.value_of("name").unwrap();
            let artist = sub_matches.value_of("artist");

            let mut songprint = songprint_for(sub_matches);
            match songprint.remove_song(name, artist) {
                Ok(true) => {
                    if let Err(e) = songprint.save() {
                        eprintln!("Error: {}", e);
                        process::exit(1);
                    }
                    println!("Removed {}", name);
                }
                Ok(false) => {
                    eprintln!("{} is not in the catalog", name);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        ("list", Some(sub_matches)) => {
            let mut songprint = songprint_for(sub_matches);
            match songprint.list_songs() {
                Ok(songs) => {
                    for song in songs {
                        match song.artist {
                            Some(artist) => println!("{} - {}", artist, song.name),
                            None => println!("{}", song.name),
                        }
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        ("recognize", Some(sub_matches)) => {
            let input_file = sub_matches.value_of("input").unwrap();
            let format = parse_format(sub_matches.value_of("format").unwrap());

            let mut songprint = songprint_for(sub_matches);
            match songprint.recognize_from_file(input_file) {
                Ok(Some(result)) => {
                    let output = MatchOutput::format_result(&result, format);
                    println!("{}", output);
                }
                Ok(None) => {
                    println!("No match");
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        ("listen", Some(sub_matches)) => {
            let duration: f32 = match sub_matches.value_of("duration").unwrap().parse() {
                Ok(duration) => duration,
                Err(_) => {
                    eprintln!("Error: invalid duration");
                    process::exit(1);
                }
            };
            let device = sub_matches.value_of("device").map(|s| s.to_string());
            let format = parse_format(sub_matches.value_of("format").unwrap());

            let mut songprint = songprint_for(sub_matches);
            match songprint.recognize_from_microphone(duration, device) {
                Ok(Some(result)) => {
                    let output = MatchOutput::format_result(&result, format);
                    println!("{}", output);
                }
                Ok(None) => {
                    println!("No match");
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        ("devices", Some(_)) => {
            match songprint::audio::AudioRecorder::list_input_devices() {
                Ok(devices) => {
                    for device in devices {
                        println!("{}", device);
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        _ => {
            eprintln!("No subcommand given. Use --help for usage information.");
            process::exit(1);
        }
    }
}

fn catalog_arg() -> Arg<'static, 'static> {
    Arg::with_name("catalog")
        .short("c")
        .long("catalog")
        .value_name("PATH")
        .help("Base path of the catalog backing store")
        .takes_value(true)
}

fn format_arg() -> Arg<'static, 'static> {
    Arg::with_name("format")
        .short("f")
        .long("format")
        .value_name("FORMAT")
        .help("Output format: simple, json, csv")
        .takes_value(true)
        .default_value("simple")
}

fn verbose_arg() -> Arg<'static, 'static> {
    Arg::with_name("verbose")
        .short("v")
        .long("verbose")
        .help("Enable verbose diagnostic output")
}

fn parse_format(format_str: &str) -> OutputFormat {
    match format_str {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        _ => OutputFormat::Simple,
    }
}

fn songprint_for(sub_matches: &clap::ArgMatches) -> SongPrint {
    let mut config = Config::default().with_quiet_mode(!sub_matches.is_present("verbose"));
    if let Some(catalog) = sub_matches.value_of("catalog") {
        config = config.with_catalog_path(catalog);
    }
    SongPrint::new(config)
}
