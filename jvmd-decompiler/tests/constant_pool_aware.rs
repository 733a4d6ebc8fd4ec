mod common;

use common::{instance_method, render, render_minimal, static_method, with_handler};
use jvmd_decompiler::constant_pool::{BootstrapMethod, ConstantPoolTable, PoolEntry};
use jvmd_decompiler::{DecompilerOptions, MethodDecompiler};
use jvmd_ir::method::ExceptionTableEntry;

fn hi(index: u16) -> u8 {
    (index >> 8) as u8
}

fn lo(index: u16) -> u8 {
    index as u8
}

fn with_pool(pool: &ConstantPoolTable) -> MethodDecompiler<'_> {
    MethodDecompiler::with_pool(pool, DecompilerOptions::default())
}

#[test]
fn static_field_receiver_and_string_argument() {
    let mut pool = ConstantPoolTable::new();
    let out = pool.add_field_ref("java/lang/System", "out", "Ljava/io/PrintStream;");
    let text = pool.add_string("hi");
    let println = pool.add_method_ref("java/io/PrintStream", "println", "(Ljava/lang/String;)V");
    let code = [
        0xb2, hi(out), lo(out),
        0x12, lo(text),
        0xb6, hi(println), lo(println),
        0xb1,
    ];
    let method = static_method("greet", "()V", &code);
    assert_eq!(
        render(&with_pool(&pool), &method),
        "System.out.println(\"hi\");\nreturn;\n"
    );
}

#[test]
fn minimal_simulator_skips_pool_opcodes() {
    // Same body without a pool: nothing but the return survives.
    let code = [0xb2, 0x00, 0x05, 0x12, 0x07, 0xb6, 0x00, 0x09, 0xb1];
    let method = static_method("greet", "()V", &code);
    assert_eq!(render_minimal(&method), "return;\n");
}

#[test]
fn new_dup_init_collapses_into_construction() {
    let mut pool = ConstantPoolTable::new();
    let class = pool.add_class("java/lang/StringBuilder");
    let text = pool.add_string("x");
    let init = pool.add_method_ref("java/lang/StringBuilder", "<init>", "(Ljava/lang/String;)V");
    let code = [
        0xbb, hi(class), lo(class),
        0x59,
        0x12, lo(text),
        0xb7, hi(init), lo(init),
        0xb0,
    ];
    let method = static_method("make", "()Ljava/lang/StringBuilder;", &code);
    assert_eq!(
        render(&with_pool(&pool), &method),
        "return new StringBuilder(\"x\");\n"
    );
}

#[test]
fn super_constructor_call() {
    let mut pool = ConstantPoolTable::new();
    let init = pool.add_method_ref("java/lang/Object", "<init>", "()V");
    let code = [0x2a, 0xb7, hi(init), lo(init), 0xb1];
    let method = instance_method("<init>", "()V", &code);
    assert_eq!(render(&with_pool(&pool), &method), "super();\nreturn;\n");
}

#[test]
fn concat_recipe_interleaves_arguments() {
    let mut pool = ConstantPoolTable::new();
    let factory = pool.add_method_ref(
        "java/lang/invoke/StringConcatFactory",
        "makeConcatWithConstants",
        "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;Ljava/lang/invoke/MethodType;Ljava/lang/String;[Ljava/lang/Object;)Ljava/lang/invoke/CallSite;",
    );
    let handle = pool.push(PoolEntry::MethodHandle {
        reference_kind: 6,
        reference_index: factory,
    });
    let recipe = pool.add_string("n=\u{1}");
    let bootstrap = pool.add_bootstrap_method(BootstrapMethod {
        method_handle: handle,
        arguments: vec![recipe],
    });
    let name_and_type = pool.add_name_and_type("makeConcatWithConstants", "(I)Ljava/lang/String;");
    let site = pool.push(PoolEntry::InvokeDynamic {
        bootstrap_method: bootstrap,
        name_and_type_index: name_and_type,
    });
    let code = [0x1a, 0xba, hi(site), lo(site), 0x00, 0x00, 0xb0];
    let method = static_method("label", "(I)Ljava/lang/String;", &code);
    assert_eq!(
        render(&with_pool(&pool), &method),
        "return (\"n=\" + a);\n"
    );
}

#[test]
fn kotlin_null_checks_are_hidden_by_default() {
    let mut pool = ConstantPoolTable::new();
    let name = pool.add_string("p");
    let check = pool.add_method_ref(
        "kotlin/jvm/internal/Intrinsics",
        "checkNotNullParameter",
        "(Ljava/lang/Object;Ljava/lang/String;)V",
    );
    let code = [0x2a, 0x12, lo(name), 0xb8, hi(check), lo(check), 0xb1];
    let method = static_method("use", "(Ljava/lang/String;)V", &code);
    assert_eq!(render(&with_pool(&pool), &method), "return;\n");

    let shown = MethodDecompiler::with_pool(
        &pool,
        DecompilerOptions {
            hide_kotlin_intrinsics: false,
            ..DecompilerOptions::default()
        },
    );
    assert_eq!(
        render(&shown, &method),
        "Intrinsics.checkNotNullParameter(a, \"p\");\nreturn;\n"
    );
}

#[test]
fn cast_receiver_is_parenthesized() {
    let mut pool = ConstantPoolTable::new();
    let string = pool.add_class("java/lang/String");
    let length = pool.add_method_ref("java/lang/String", "length", "()I");
    let code = [
        0x2b,
        0xc0, hi(string), lo(string),
        0xb6, hi(length), lo(length),
        0xac,
    ];
    let method = instance_method("size", "(Ljava/lang/Object;)I", &code);
    assert_eq!(
        render(&with_pool(&pool), &method),
        "return ((String) a).length();\n"
    );
}

#[test]
fn iterator_loop_becomes_for_each() {
    let mut pool = ConstantPoolTable::new();
    let iterator = pool.add_interface_method_ref("java/util/List", "iterator", "()Ljava/util/Iterator;");
    let has_next = pool.add_interface_method_ref("java/util/Iterator", "hasNext", "()Z");
    let next = pool.add_interface_method_ref("java/util/Iterator", "next", "()Ljava/lang/Object;");
    let out = pool.add_field_ref("java/lang/System", "out", "Ljava/io/PrintStream;");
    let println = pool.add_method_ref("java/io/PrintStream", "println", "(Ljava/lang/Object;)V");
    let code = [
        0x2a, // aload_0
        0xb9, hi(iterator), lo(iterator), 0x01, 0x00,
        0x4c, // astore_1
        0x2b, // 7: aload_1
        0xb9, hi(has_next), lo(has_next), 0x01, 0x00,
        0x99, 0x00, 0x14, // 13: ifeq 33
        0x2b,
        0xb9, hi(next), lo(next), 0x01, 0x00,
        0x4d, // astore_2
        0xb2, hi(out), lo(out),
        0x2c,
        0xb6, hi(println), lo(println),
        0xa7, 0xff, 0xe9, // 30: goto 7
        0xb1, // 33: return
    ];
    let method = static_method("dump", "(Ljava/util/List;)V", &code);
    assert_eq!(
        render(&with_pool(&pool), &method),
        "for (Object v2 : a) {\n    System.out.println(v2);\n}\n"
    );
}

#[test]
fn catch_clause_names_the_pool_class() {
    let mut pool = ConstantPoolTable::new();
    let arith = pool.add_class("java/lang/ArithmeticException");
    let code = [0x10, 0x0a, 0x1a, 0x6c, 0xac, 0x4c, 0x02, 0xac];
    let method = with_handler(
        static_method("safe", "(I)I", &code),
        ExceptionTableEntry {
            start_pc: 0,
            end_pc: 5,
            handler_pc: 5,
            catch_type: arith,
        },
    );
    assert_eq!(
        render(&with_pool(&pool), &method),
        "try {\n    return (10 / a);\n} catch (ArithmeticException v1) {\n    return -1;\n}\n"
    );
}

fn handler_row(start_pc: u16, end_pc: u16, handler_pc: u16, catch_type: u16) -> ExceptionTableEntry {
    ExceptionTableEntry {
        start_pc,
        end_pc,
        handler_pc,
        catch_type,
    }
}

#[test]
fn typed_handler_falls_through_to_join() {
    let mut pool = ConstantPoolTable::new();
    let arith = pool.add_class("java/lang/ArithmeticException");
    let code = [
        0x1a, 0x1b, 0x6c, 0x3b, // a = a / b
        0xa7, 0x00, 0x06, // goto 10
        0x4d, 0x03, 0x3b, // astore_2; a = 0
        0x1a, 0xac, // iload_0; ireturn
    ];
    let method = with_handler(static_method("quotient", "(II)I", &code), handler_row(0, 4, 7, arith));
    assert_eq!(
        render(&with_pool(&pool), &method),
        "try {\n    a = (a / b);\n} catch (ArithmeticException v2) {\n    a = 0;\n}\nreturn a;\n"
    );
}

#[test]
fn two_handlers_share_one_range() {
    let mut pool = ConstantPoolTable::new();
    let arith = pool.add_class("java/lang/ArithmeticException");
    let code = [
        0x1a, 0x1b, 0x6c, 0x3b, // 0: a = a / b
        0xa7, 0x00, 0x0c, // 4: goto 16
        0x4d, 0x02, 0x3b, // 7: astore_2; a = -1
        0xa7, 0x00, 0x06, // 10: goto 16
        0x4d, 0x03, 0x3b, // 13: astore_2; a = 0
        0x1a, 0xac, // 16: iload_0; ireturn
    ];
    let method = static_method("quotient", "(II)I", &code);
    let method = with_handler(method, handler_row(0, 4, 7, arith));
    let method = with_handler(method, handler_row(0, 4, 13, 0));
    assert_eq!(
        render(&with_pool(&pool), &method),
        "try {\n    a = (a / b);\n} catch (ArithmeticException v2) {\n    a = -1;\n} catch (Throwable v2) {\n    a = 0;\n}\nreturn a;\n"
    );
}

#[test]
fn long_constants_are_wide_for_pop2() {
    let mut pool = ConstantPoolTable::new();
    let big = pool.push(PoolEntry::Long(1 << 40));
    let now = pool.add_method_ref("java/lang/System", "nanoTime", "()J");
    // ldc2_w big; pop2; invokestatic nanoTime; pop2; return
    let code = [
        0x14, hi(big), lo(big),
        0x58,
        0xb8, hi(now), lo(now),
        0x58,
        0xb1,
    ];
    let method = static_method("tick", "()V", &code);
    assert_eq!(
        render(&with_pool(&pool), &method),
        "System.nanoTime();\nreturn;\n"
    );
}
