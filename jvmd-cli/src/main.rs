mod fixture;

use clap::{Parser, Subcommand};
use jvmd_decompiler::constant_pool::{ConstantPool, ConstantPoolTable};
use jvmd_decompiler::java_emitter::emit_method_with_names;
use jvmd_decompiler::naming::names_for_method;
use jvmd_decompiler::{DecompilerOptions, MethodAnalysis, MethodDecompiler};
use jvmd_ir::exception::CatchType;
use jvmd_ir::instruction::{Instruction, Operand};
use jvmd_ir::method::MethodInput;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::fixture::ClassFixture;

#[derive(Parser)]
#[command(name = "jvmd", about = "JVM-style bytecode method decompiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the class name, version and pool size of a fixture
    Info {
        /// Path to the YAML class fixture
        input: PathBuf,
    },
    /// Disassemble method bodies to a bytecode listing
    Disasm {
        input: PathBuf,
        /// Only this method
        #[arg(short, long)]
        method: Option<String>,
    },
    /// Print basic blocks, edges and exception regions
    Cfg {
        input: PathBuf,
        #[arg(short, long)]
        method: Option<String>,
    },
    /// Decompile methods to Java-flavored source
    Decompile {
        input: PathBuf,
        #[arg(short, long)]
        method: Option<String>,
        /// Only use the two-returns if/else pattern
        #[arg(long)]
        no_regions: bool,
        /// Keep `x + 0` and unfolded constants
        #[arg(long)]
        no_simplify: bool,
        /// Keep Kotlin `Intrinsics` null checks and synthetic `$` calls
        #[arg(long)]
        show_intrinsics: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { input } => cmd_info(&input),
        Commands::Disasm { input, method } => cmd_disasm(&input, method.as_deref()),
        Commands::Cfg { input, method } => cmd_cfg(&input, method.as_deref()),
        Commands::Decompile {
            input,
            method,
            no_regions,
            no_simplify,
            show_intrinsics,
        } => {
            let options = DecompilerOptions {
                hide_kotlin_intrinsics: !show_intrinsics,
                hide_synthetic_dollar_calls: !show_intrinsics,
                structure_regions: !no_regions,
                simplify: !no_simplify,
            };
            cmd_decompile(&input, method.as_deref(), options);
        }
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

fn load(path: &Path) -> ClassFixture {
    let file = File::open(path).unwrap_or_else(|e| fail(format!("{}: {e}", path.display())));
    let map = match unsafe { Mmap::map(&file) } {
        Ok(map) => map,
        Err(e) => fail(format!("{}: {e}", path.display())),
    };
    let text = std::str::from_utf8(&map).unwrap_or_else(|e| fail(format!("{}: {e}", path.display())));
    ClassFixture::from_yaml(text).unwrap_or_else(|e| fail(e))
}

/// Methods of `fixture`, narrowed to `only` when given.
fn select_methods(fixture: &ClassFixture, only: Option<&str>) -> Vec<MethodInput> {
    let methods = fixture.methods().unwrap_or_else(|e| fail(e));
    match only {
        None => methods,
        Some(name) => {
            let picked: Vec<_> = methods.into_iter().filter(|m| m.name == name).collect();
            if picked.is_empty() {
                fail(format!("no method named `{name}` in {}", fixture.class));
            }
            picked
        }
    }
}

fn cmd_info(path: &Path) {
    let fixture = load(path);
    println!("=== Class Info ===");
    println!("Class:            {}", fixture.class);
    println!(
        "Version:          {} {}",
        fixture.version.major, fixture.version.minor
    );
    println!("Pool entries:     {}", fixture.constant_pool.len());
    println!("Bootstrap:        {}", fixture.bootstrap_methods.len());
    println!("Methods:          {}", fixture.methods.len());
}

fn cmd_disasm(path: &Path, only: Option<&str>) {
    let fixture = load(path);
    let pool = fixture.pool();
    println!("# Class: {}", fixture.class);
    println!();
    for method in select_methods(&fixture, only) {
        print!("{}", disasm_method(&method, &pool));
        println!();
    }
}

fn disasm_method(method: &MethodInput, pool: &ConstantPoolTable) -> String {
    let mut out = format!(".method {}{} {{\n", method.name, method.descriptor);
    let Some(code) = &method.code else {
        out.push_str("    # (no code - native or abstract)\n}\n");
        return out;
    };
    out.push_str(&format!(
        "    # max_stack: {}, max_locals: {}, code_size: {}\n",
        code.max_stack,
        code.max_locals,
        code.code.len()
    ));

    let analysis = MethodAnalysis::of(code);
    let mut last_line = None;
    for insn in &analysis.instructions {
        if let Some(line) = code.line_for(insn.offset).filter(|&l| Some(l) != last_line) {
            out.push_str(&format!("    # line {line}\n"));
            last_line = Some(line);
        }
        let operand = format_operand(insn, pool);
        let ops = if operand.is_empty() {
            String::new()
        } else {
            format!(" {operand}")
        };
        out.push_str(&format!("    {:#06x}  {}{ops}\n", insn.offset, insn.opcode));
    }

    for row in &code.exception_table {
        let catch = match CatchType::from_index(row.catch_type) {
            CatchType::Any => "catch_all".to_string(),
            CatchType::Class(index) => format!("catch {}", class_label(pool, index)),
        };
        out.push_str(&format!(
            "    # try [{:#x}..{:#x}) {catch} -> {:#x}\n",
            row.start_pc, row.end_pc, row.handler_pc
        ));
    }
    out.push_str("}\n");
    out
}

fn class_label(pool: &dyn ConstantPool, index: u16) -> String {
    pool.class_name(index)
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{index}"))
}

fn pool_label(pool: &dyn ConstantPool, index: u16) -> String {
    if let Some(member) = pool.member_ref(index) {
        return format!("{}.{}:{}", member.owner, member.name, member.descriptor);
    }
    if let Some(site) = pool.invoke_dynamic(index) {
        return format!("{}:{}", site.name, site.descriptor);
    }
    if let Some(constant) = pool.literal(index) {
        return format!("{constant:?}");
    }
    format!("#{index}")
}

fn format_operand(insn: &Instruction, pool: &dyn ConstantPool) -> String {
    match &insn.operand {
        Operand::None => String::new(),
        Operand::Local(slot) => format!("v{slot}"),
        Operand::Imm(value) => format!("{value}"),
        Operand::Branch(target) => format!("-> {target:#x}"),
        Operand::ConstPool(index) => pool_label(pool, *index),
        Operand::Iinc { index, delta } => format!("v{index}, {delta}"),
        Operand::InvokeInterface { index, count } => format!("{}, {count}", pool_label(pool, *index)),
        Operand::MultiANewArray { index, dimensions } => {
            format!("{}, {dimensions}", class_label(pool, *index))
        }
        Operand::Switch(table) => {
            let cases: Vec<String> = table
                .cases
                .iter()
                .map(|(key, target)| format!("{key}: {target:#x}"))
                .collect();
            format!("{{ {}, default: {:#x} }}", cases.join(", "), table.default)
        }
        Operand::UndecodedTail { bytes, reason } => {
            format!("<{} undecoded bytes: {reason}>", bytes.len())
        }
    }
}

fn cmd_cfg(path: &Path, only: Option<&str>) {
    let fixture = load(path);
    for method in select_methods(&fixture, only) {
        print!("{}", cfg_method(&method));
        println!();
    }
}

fn cfg_method(method: &MethodInput) -> String {
    let mut out = format!(".method {}{}\n", method.name, method.descriptor);
    let Some(code) = &method.code else {
        out.push_str("    # (no code)\n");
        return out;
    };
    let analysis = MethodAnalysis::of(code);
    for block in analysis.cfg.blocks() {
        let succs: Vec<String> = block.succs.iter().map(|s| format!("B{s}")).collect();
        out.push_str(&format!(
            "    B{} [{:#x}..{:#x}) -> [{}]\n",
            block.id,
            block.start,
            block.end,
            succs.join(", ")
        ));
        if let Some(edges) = &block.switch_edges {
            if let Some(default) = edges.default {
                out.push_str(&format!("        default -> B{default}\n"));
            }
            for (key, target) in &edges.cases {
                out.push_str(&format!("        case {key} -> B{target}\n"));
            }
        }
    }
    for region in &analysis.regions {
        let handlers: Vec<String> = region
            .handlers
            .iter()
            .map(|h| match h.catch_type {
                CatchType::Any => format!("any -> B{}", h.block),
                CatchType::Class(index) => format!("#{index} -> B{}", h.block),
            })
            .collect();
        out.push_str(&format!(
            "    try [{:#x}..{:#x}) {}\n",
            region.start_pc,
            region.end_pc,
            handlers.join(", ")
        ));
    }
    out
}

fn cmd_decompile(path: &Path, only: Option<&str>, options: DecompilerOptions) {
    let fixture = load(path);
    let pool = fixture.pool();
    let decompiler = MethodDecompiler::with_pool(&pool, options);
    log::debug!("decompiling {} with {options:?}", fixture.class);
    println!("// class {}", fixture.class);
    for method in select_methods(&fixture, only) {
        match decompile_to_string(&decompiler, &method, &fixture.class) {
            Ok(text) => {
                println!();
                print!("{text}");
            }
            Err(e) => fail(e),
        }
    }
}

fn decompile_to_string(
    decompiler: &MethodDecompiler<'_>,
    method: &MethodInput,
    class_name: &str,
) -> Result<String, jvmd_decompiler::DecompileError> {
    let ast = decompiler.decompile(method)?;
    let names = names_for_method(method);
    Ok(emit_method_with_names(&ast, method.access, class_name, &names))
}
