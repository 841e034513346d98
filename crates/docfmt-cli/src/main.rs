use clap::{Args as ClapArgs, Parser, Subcommand};
use docfmt_core::{JsonDocument, Node, XmlDocument, XmlOpts, catalog, files, path};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "docfmt",
    about = "Convert and edit book catalogs across CSV, JSON and XML",
    version
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Convert a books CSV into a title-keyed JSON document
    CsvToJson(CsvToJsonArgs),
    /// Convert a books CSV into a <library> XML document
    CsvToXml(CsvToXmlArgs),
    /// Get the value at a nested path of a JSON file
    Get(GetArgs),
    /// Set a value (raw JSON) at a nested path; prints or writes with --out
    Set(SetArgs),
    /// Remove the value at a nested path; prints or writes with --out
    Remove(RemoveArgs),
    /// Run an XPath query against an XML file, optionally deleting the matches
    Query(QueryArgs),
    /// Convert an XML file to JSON
    XmlToJson(ConvertArgs),
    /// Convert a JSON file to XML
    JsonToXml(ConvertArgs),
    /// Zip files (stored by base name)
    Zip(ZipArgs),
    /// Extract a zip archive
    Unzip(UnzipArgs),
    /// List entries of a directory
    Ls(LsArgs),
}

#[derive(ClapArgs, Debug)]
struct CsvToJsonArgs {
    /// Input CSV with a header row
    csv: PathBuf,
    /// Column whose value keys each record
    #[arg(long, default_value = "title")]
    key_column: String,
    /// Optional output .json path; otherwise prints to stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct CsvToXmlArgs {
    /// Input CSV; columns are read as title, author, year, publisher
    csv: PathBuf,
    /// Optional output .xml path; otherwise prints to stdout
    #[arg(long)]
    out: Option<PathBuf>,
    /// Root element name
    #[arg(long, default_value = "library")]
    root: String,
    /// Spaces per indentation level
    #[arg(long, default_value_t = 2)]
    indent: usize,
}

#[derive(ClapArgs, Debug)]
struct GetArgs {
    /// JSON file to load
    path: PathBuf,
    /// Nested path, e.g. /1984/author
    #[arg(long)]
    ptr: String,
}

#[derive(ClapArgs, Debug)]
struct SetArgs {
    /// JSON file to load (missing files start empty)
    path: PathBuf,
    /// Nested path, e.g. /1984/year
    #[arg(long)]
    ptr: String,
    /// New value as raw JSON (e.g., 123, true, "str", {"a":1})
    #[arg(long)]
    value: String,
    /// Optional output .json path to write; otherwise prints to stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct RemoveArgs {
    /// JSON file to load
    path: PathBuf,
    /// Nested path, e.g. /Brave New World
    #[arg(long)]
    ptr: String,
    /// Optional output .json path to write; otherwise prints to stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct QueryArgs {
    /// XML file to load
    path: PathBuf,
    /// XPath expression, e.g. //book[author='George Orwell']
    #[arg(long)]
    xpath: String,
    /// Delete matching elements instead of printing them
    #[arg(long, default_value_t = false)]
    delete: bool,
    /// Output .xml path for --delete; otherwise prints to stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct ConvertArgs {
    /// Input file
    input: PathBuf,
    /// Optional output path; otherwise prints to stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct ZipArgs {
    /// Files to add
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Output .zip path
    #[arg(long)]
    out: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct UnzipArgs {
    /// Archive to extract
    zip: PathBuf,
    /// Destination directory
    #[arg(long)]
    dest: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct LsArgs {
    dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Cmd::CsvToJson(a) => cmd_csv_to_json(a),
        Cmd::CsvToXml(a) => cmd_csv_to_xml(a),
        Cmd::Get(a) => cmd_get(a),
        Cmd::Set(a) => cmd_set(a),
        Cmd::Remove(a) => cmd_remove(a),
        Cmd::Query(a) => cmd_query(a),
        Cmd::XmlToJson(a) => cmd_xml_to_json(a),
        Cmd::JsonToXml(a) => cmd_json_to_xml(a),
        Cmd::Zip(a) => cmd_zip(a),
        Cmd::Unzip(a) => cmd_unzip(a),
        Cmd::Ls(a) => cmd_ls(a),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(code: i32, msg: impl Display) -> ! {
    eprintln!("error: {}", msg);
    std::process::exit(code);
}

fn emit(out: Option<&Path>, text: &str) {
    match out {
        Some(p) => files::write_to_file(p, text, false)
            .unwrap_or_else(|e| fail(5, format!("writing {}: {}", p.display(), e))),
        None => print!("{}", text),
    }
}

fn load_json(p: &Path) -> JsonDocument {
    JsonDocument::load_from_path(p).unwrap_or_else(|e| fail(2, e))
}

fn cmd_csv_to_json(args: CsvToJsonArgs) {
    let records = files::read_csv(&args.csv).unwrap_or_else(|e| fail(2, e));
    let doc = catalog::records_to_json(&records, &args.key_column).unwrap_or_else(|e| fail(3, e));
    let text = doc.display_json().unwrap_or_else(|e| fail(4, e));
    emit(args.out.as_deref(), &format!("{}\n", text));
}

fn cmd_csv_to_xml(args: CsvToXmlArgs) {
    let text = files::load_file(&args.csv)
        .unwrap_or_else(|e| fail(2, e))
        .unwrap_or_else(|| fail(2, format!("not found: {}", args.csv.display())));
    let table = docfmt_core::parse_table(&text).unwrap_or_else(|e| fail(3, e));
    if table.header != catalog::BOOK_COLUMNS {
        tracing::warn!(header = ?table.header, "unexpected header; columns are read positionally");
    }
    let mut doc = XmlDocument::with_opts(XmlOpts {
        root_name: args.root,
        indent: args.indent,
    });
    catalog::table_to_xml(&table, &mut doc);
    let xml = doc.display_xml().unwrap_or_else(|e| fail(4, e));
    emit(args.out.as_deref(), &xml);
}

fn cmd_get(args: GetArgs) {
    let doc = load_json(&args.path);
    let keys = path::split_path(&args.ptr);
    match doc.get_nested_element(&keys) {
        Some(x) => {
            let v = serde_json::Value::from(x);
            match serde_json::to_string_pretty(&v) {
                Ok(s) => println!("{}", s),
                Err(e) => fail(4, e),
            }
        }
        None => {
            eprintln!("not found: {}", args.ptr);
            std::process::exit(3);
        }
    }
}

fn cmd_set(args: SetArgs) {
    let mut doc = if args.path.exists() {
        load_json(&args.path)
    } else {
        JsonDocument::new()
    };
    let new_val: serde_json::Value = serde_json::from_str(&args.value)
        .unwrap_or_else(|e| fail(3, format!("invalid --value JSON: {}", e)));
    let keys = path::split_path(&args.ptr);
    doc.add_nested_element(&keys, Node::from(new_val))
        .unwrap_or_else(|e| fail(4, e));
    write_json(&doc, args.out.as_deref());
}

fn cmd_remove(args: RemoveArgs) {
    let mut doc = load_json(&args.path);
    let keys = path::split_path(&args.ptr);
    doc.delete_nested_element(&keys)
        .unwrap_or_else(|e| fail(4, e));
    write_json(&doc, args.out.as_deref());
}

fn write_json(doc: &JsonDocument, out: Option<&Path>) {
    match out {
        Some(p) => doc
            .save_to_path(p)
            .unwrap_or_else(|e| fail(5, format!("writing {}: {}", p.display(), e))),
        None => println!("{}", doc.display_json().unwrap_or_else(|e| fail(4, e))),
    }
}

fn cmd_query(args: QueryArgs) {
    let mut doc = XmlDocument::load_from_path(&args.path).unwrap_or_else(|e| fail(2, e));
    if args.delete {
        let n = doc.delete_elements(&args.xpath).unwrap_or_else(|e| fail(3, e));
        eprintln!("removed {} element(s)", n);
        let xml = doc.display_xml().unwrap_or_else(|e| fail(4, e));
        emit(args.out.as_deref(), &xml);
        return;
    }
    let hits = doc.query(&args.xpath).unwrap_or_else(|e| fail(3, e));
    for r in &hits {
        if let Some(el) = doc.element(r) {
            println!("{}\t{}", el.name, el.text_content());
        }
    }
    if hits.is_empty() {
        std::process::exit(1);
    }
}

fn cmd_xml_to_json(args: ConvertArgs) {
    let doc = XmlDocument::load_from_path(&args.input).unwrap_or_else(|e| fail(2, e));
    let json = doc.to_json(true).unwrap_or_else(|e| fail(4, e));
    emit(args.out.as_deref(), &format!("{}\n", json));
}

fn cmd_json_to_xml(args: ConvertArgs) {
    let json = load_json(&args.input);
    let doc = XmlDocument::from_tree_store(json.root()).unwrap_or_else(|e| fail(3, e));
    let xml = doc.display_xml().unwrap_or_else(|e| fail(4, e));
    emit(args.out.as_deref(), &xml);
}

fn cmd_zip(args: ZipArgs) {
    let n = files::zip_files(&args.files, &args.out).unwrap_or_else(|e| fail(2, e));
    eprintln!("stored {} file(s) in {}", n, args.out.display());
}

fn cmd_unzip(args: UnzipArgs) {
    let n = files::unzip_file(&args.zip, &args.dest).unwrap_or_else(|e| fail(2, e));
    eprintln!("extracted {} entr(ies) to {}", n, args.dest.display());
}

fn cmd_ls(args: LsArgs) {
    match files::list_files_in_directory(&args.dir) {
        Ok(names) => {
            for n in names {
                println!("{}", n);
            }
        }
        Err(e) => fail(2, e),
    }
}
