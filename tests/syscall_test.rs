mod common;
use common::*;
use gvm::mach::*;

fn run_with(rig: &mut Rig, a: &mut Asm) -> Vec<i32> {
    a.op(Opcode::End);
    expect_ended(rig.run(a));
    rig.stack().as_slice().to_vec()
}

fn eval(a: &mut Asm) -> Vec<i32> {
    run_with(&mut Rig::new(&[]), a)
}

#[test]
fn test_printf_to_console() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.string(b"N=%d %s%c!%%\n")
        .push(-42)
        .string(b"ok")
        .push(0x178)
        .push(4)
        .op(Opcode::Printf);
    assert!(run_with(&mut rig, &mut a).is_empty());
    assert_eq!(rig.text(), b"N=-42 okx!%\n".to_vec());
    assert_eq!(rig.log(), vec!["lcd 0"]);
}

#[test]
fn test_printf_joins_double_bytes() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.string(&[0xb0, 0xa1, b'%', b's'])
        .string(&[0xc4, 0xe3])
        .push(2)
        .op(Opcode::Printf);
    run_with(&mut rig, &mut a);
    assert_eq!(rig.text(), vec![0xb0, 0xa1, 0xc4, 0xe3]);
}

#[test]
fn test_printf_missing_args_read_zero() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.string(b"%d|%s|").push(1).op(Opcode::Printf);
    run_with(&mut rig, &mut a);
    assert_eq!(rig.text(), b"0||".to_vec());
}

#[test]
fn test_sprintf_to_memory() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.push(0x2000)
        .op(Opcode::MakeRef)
        .push(0x7f)
        .op(Opcode::Store)
        .op(Opcode::Pop)
        .push(0x2000)
        .string(b"%d-%d")
        .push(3)
        .push(-4)
        .push(4)
        .op(Opcode::Sprintf);
    run_with(&mut rig, &mut a);
    assert_eq!(rig.memory().c_string(0x2000), b"3--4".to_vec());
    assert!(rig.text().is_empty());
}

#[test]
fn test_putchar_low_byte() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.push(0x141).op(Opcode::PutChar);
    run_with(&mut rig, &mut a);
    assert_eq!(rig.text(), b"A".to_vec());
}

#[test]
fn test_string_library() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.push(0x2000)
        .string(b"hello")
        .op(Opcode::StrCpy)
        .push(0x2000)
        .string(b", you")
        .op(Opcode::StrCat)
        .push(0x2000)
        .op(Opcode::StrLen)
        .push(0x2000)
        .push(b'y' as i32)
        .op(Opcode::StrChr)
        .push(0x2000)
        .string(b"you")
        .op(Opcode::StrStr)
        .push(0x2000)
        .string(b"hello")
        .op(Opcode::StrCmp)
        .string(b"abc")
        .string(b"abd")
        .op(Opcode::StrCmp)
        .push(0x2000)
        .push(b'z' as i32)
        .op(Opcode::StrChr);
    let stack = run_with(&mut rig, &mut a);
    assert_eq!(rig.memory().c_string(0x2000), b"hello, you".to_vec());
    assert_eq!(stack, vec![10, 0x2007, 0x2007, b',' as i32, -1, 0]);
}

#[test]
fn test_memory_library() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.op16(Opcode::DataInit, 0x2000)
        .int16(4)
        .raw(b"abcd")
        .push(0x2010)
        .push(b'x' as i32)
        .push(3)
        .op(Opcode::MemSet)
        .push(0x2020)
        .push(0x2000)
        .push(4)
        .op(Opcode::MemCpy)
        .push(0x2001)
        .push(0x2000)
        .push(3)
        .op(Opcode::MemMove);
    run_with(&mut rig, &mut a);
    let memory = rig.memory();
    assert_eq!(memory.read_block(0x2010, 4), b"xxx\0".to_vec());
    assert_eq!(memory.read_block(0x2020, 4), b"abcd".to_vec());
    assert_eq!(memory.read_block(0x2000, 4), b"aabc".to_vec());
}

#[test]
fn test_crc16() {
    let mut a = Asm::new();
    a.string(b"123456789").push(9).op(Opcode::Crc16);
    assert_eq!(eval(&mut a), vec![0x906e]);
}

#[test]
fn test_secret_is_involution() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.op16(Opcode::DataInit, 0x2000).int16(4).raw(b"abc\0");
    a.push(0x2000).push(3).string(b"k").op(Opcode::Secret);
    run_with(&mut rig, &mut a);
    let mask = b'k';
    assert_eq!(
        rig.memory().read_block(0x2000, 4),
        vec![b'a' ^ mask, b'b' ^ mask, b'c' ^ mask, 0]
    );

    let mut a = Asm::new();
    a.op16(Opcode::DataInit, 0x2000).int16(4).raw(b"abc\0");
    for _ in 0..2 {
        a.push(0x2000).push(3).string(b"key").op(Opcode::Secret);
    }
    run_with(&mut rig, &mut a);
    assert_eq!(rig.memory().read_block(0x2000, 4), b"abc\0".to_vec());
}

#[test]
fn test_rand_sequence() {
    let mut a = Asm::new();
    a.op(Opcode::Rand)
        .op(Opcode::Rand)
        .op(Opcode::Rand)
        .op(Opcode::Rand)
        .push(42)
        .op(Opcode::Srand)
        .op(Opcode::Rand);
    assert_eq!(eval(&mut a), vec![0, 346, 130, 10982, 14544]);
}

#[test]
fn test_character_classes() {
    let mut a = Asm::new();
    a.push(b'a' as i32)
        .op(Opcode::IsAlpha)
        .push(b'1' as i32)
        .op(Opcode::IsAlpha)
        .push(b' ' as i32)
        .op(Opcode::IsSpace)
        .push(b'F' as i32)
        .op(Opcode::IsXDigit)
        .push(b'q' as i32)
        .op(Opcode::ToUpper)
        .push(b'Q' as i32)
        .op(Opcode::ToLower);
    assert_eq!(eval(&mut a), vec![TRUE, FALSE, TRUE, TRUE, b'Q' as i32, b'q' as i32]);
}

#[test]
fn test_math_calls() {
    let mut a = Asm::new();
    a.push(-5)
        .op(Opcode::Abs)
        .push(0)
        .op(Opcode::Cos)
        .push(90)
        .op(Opcode::Sin)
        .push(180)
        .op(Opcode::Cos);
    assert_eq!(eval(&mut a), vec![5, 1024, 1024, -1024]);
}

#[test]
fn test_clock_calls() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.op(Opcode::GetMs)
        .push(0x2000)
        .op(Opcode::GetTime)
        .push(0)
        .op(Opcode::SetTime);
    let stack = run_with(&mut rig, &mut a);
    assert!((0..256).contains(&stack[0]));
    assert!(rig.memory().get_int(0x2000) >= 2020);
    assert!(rig.memory().get_char(0x2002) < 12);
}

#[test]
fn test_drawing_calls() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.push(3).push(4).push(1).op(Opcode::Point);
    a.push(0).push(1).push(2).push(3).push(1).op(Opcode::Line);
    a.push(1).push(2).push(3).push(4).push(1).push(0).op(Opcode::Box);
    a.push(1).push(2).push(3).push(4).push(2).op(Opcode::Block);
    a.push(1).push(2).push(3).push(4).push(2).op(Opcode::Rectangle);
    a.push(10).push(10).push(5).push(0).push(1).op(Opcode::Circle);
    a.push(10).push(10).push(5).push(3).push(1).push(0).op(Opcode::Ellipse);
    a.push(2).push(3).string(b"hi").push(1).op(Opcode::TextOut);
    a.op(Opcode::ClearScreen).op(Opcode::Refresh).push(2).op(Opcode::XDraw);
    assert!(run_with(&mut rig, &mut a).is_empty());
    assert_eq!(
        rig.log(),
        vec![
            "mode 0x41",
            "point 3 4",
            "mode 0x41",
            "line 0 1 2 3",
            "mode 0x50",
            "rect 1 2 3 4",
            "mode 0x12",
            "rect 1 2 3 4",
            "mode 0x02",
            "rect 1 2 3 4",
            "mode 0x41",
            "oval 10 10 5 5",
            "mode 0x50",
            "oval 10 10 5 3",
            "mode 0x01",
            "string 2 3 hi",
            "clear",
            "refresh",
            "xdraw 2",
        ]
    );
}

#[test]
fn test_block_transfer() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.op16(Opcode::DataInit, 0x2000).int16(2).raw(&[0xf0, 0x0f]);
    a.push(1).push(2).push(8).push(2).push(1).push(0x2000).op(Opcode::WriteBlock);
    a.push(0).push(0).push(16).push(1).push(0x41).push(0x2100).op(Opcode::GetBlock);
    a.push(3).push(4).op(Opcode::GetPoint);
    assert_eq!(run_with(&mut rig, &mut a), vec![1]);
    assert_eq!(rig.log(), vec!["mode 0x01", "region 1 2 8 2 [240, 15]", "mode 0x41"]);
    assert_eq!(rig.memory().read_block(0x2100, 3), vec![0x5a, 0x5a, 0]);
}

#[test]
fn test_text_calls() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.push(0x81)
        .op(Opcode::SetScreen)
        .push(2)
        .push(5)
        .op(Opcode::Locate)
        .push(1)
        .op(Opcode::UpdateLcd);
    run_with(&mut rig, &mut a);
    assert_eq!(rig.log(), vec!["text mode 129", "locate 2 5", "lcd 1"]);
}

#[test]
fn test_key_calls() {
    let mut rig = Rig::new(&[65, 66, 20]);
    let mut a = Asm::new();
    a.op(Opcode::GetChar)
        .push(0)
        .op(Opcode::GetWord)
        .push(20)
        .op(Opcode::CheckKey)
        .push(21)
        .op(Opcode::CheckKey)
        .push(20)
        .op(Opcode::ReleaseKey)
        .op(Opcode::Inkey)
        .op(Opcode::Inkey);
    assert_eq!(run_with(&mut rig, &mut a), vec![65, 66, 20, 0, 20, 0]);
}

#[test]
fn test_keyboard_failure_ends_run() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.op(Opcode::GetChar);
    let error = expect_fault(rig.run(&a), ErrorCode::HostIo);
    assert_eq!(error.offset(), Some(CODE_START));
}

#[test]
fn test_file_calls() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.string(b"a.txt").string(b"r").op(Opcode::FOpen);
    a.push(0x2000).push(1).push(4).push(3).op(Opcode::FRead);
    a.push(0x2001).push(1).push(2).push(3).op(Opcode::FWrite);
    a.push(3).push(10).push(0).op(Opcode::FSeek);
    a.push(3).op(Opcode::FTell);
    a.push(3).op(Opcode::FEof);
    a.push(3).op(Opcode::GetC);
    a.push(b'x' as i32).push(3).op(Opcode::PutC);
    a.push(3).op(Opcode::Rewind);
    a.string(b"d").op(Opcode::MakeDir);
    a.string(b"d").op(Opcode::DeleteFile);
    a.string(b"d").op(Opcode::ChDir);
    a.push(3).op(Opcode::FClose);
    let stack = run_with(&mut rig, &mut a);
    assert_eq!(stack, vec![3, 4, 2, 10, 0, TRUE, -1, b'x' as i32, TRUE, FALSE, FALSE]);
    assert_eq!(rig.memory().read_block(0x2000, 4), vec![1, 2, 3, 4]);
    assert_eq!(
        rig.log(),
        vec!["open a.txt r", "write [2, 3]", "seek 3 10 0", "close 3"]
    );
}

#[test]
fn test_negative_read_length_reads_nothing() {
    let mut rig = Rig::new(&[]);
    let mut a = Asm::new();
    a.push(0x2000).push(1).push(-1).push(3).op(Opcode::FRead);
    assert_eq!(run_with(&mut rig, &mut a), vec![0]);
    assert_eq!(rig.memory().get_char(0x2000), 0);
}

fn pick(keys: &[i32], names: &[&str]) -> (Rig, i32) {
    let mut rig = Rig::with_files(keys, names);
    let mut a = Asm::new();
    a.push(0x2000).op(Opcode::FileList);
    let stack = run_with(&mut rig, &mut a);
    (rig, stack[0])
}

#[test]
fn test_picker_confirms_selection() {
    let (rig, val) = pick(&[21, 13], &["a.lav", "b.lav"]);
    assert_eq!(val, TRUE);
    assert_eq!(rig.memory().c_string(0x2000), b"a.lav".to_vec());
    let log = rig.log();
    assert_eq!(log[0], "mode 0x50");
    assert_eq!(log[1], "rect 0 0 159 79");
    assert_eq!(log[2], "mode 0x41");
    assert_eq!(log[3], "string 0 0 ..");
    assert_eq!(log[4], "string 0 13 a.lav");
    assert!(log.contains(&"rect 0 13 159 25".to_string()));
}

#[test]
fn test_picker_cancel() {
    let (rig, val) = pick(&[22, 27], &["a.lav"]);
    assert_eq!(val, FALSE);
    assert_eq!(rig.memory().get_char(0x2000), 0);
}

#[test]
fn test_picker_stops_at_ends() {
    let (rig, _) = pick(&[20, 23, 13], &["a.lav"]);
    assert_eq!(rig.memory().c_string(0x2000), b"..".to_vec());
    let (rig, _) = pick(&[21, 21, 21, 21, 13], &["a.lav", "b.lav"]);
    assert_eq!(rig.memory().c_string(0x2000), b"b.lav".to_vec());
}

#[test]
fn test_picker_scrolls() {
    let names = ["f0", "f1", "f2", "f3", "f4", "f5", "f6", "f7"];
    let (rig, _) = pick(&[21, 21, 21, 21, 21, 21, 21, 13], &names);
    assert_eq!(rig.memory().c_string(0x2000), b"f6".to_vec());
    let log = rig.log();
    let frames: Vec<&String> = log.iter().filter(|s| s.starts_with("string 0 0 ")).collect();
    assert_eq!(frames.last().map(|s| s.as_str()), Some("string 0 0 f1"));
}

#[test]
fn test_picker_returns_gb2312_names() {
    let (rig, val) = pick(&[21, 13], &["中文.lav"]);
    assert_eq!(val, TRUE);
    assert_eq!(rig.memory().c_string(0x2000), vec![0xd6, 0xd0, 0xce, 0xc4, b'.', b'l', b'a', b'v']);
}

#[test]
fn test_picker_out_of_keys_faults() {
    let mut rig = Rig::with_files(&[21], &["a.lav"]);
    let mut a = Asm::new();
    a.push(0x2000).op(Opcode::FileList);
    expect_fault(rig.run(&a), ErrorCode::HostIo);
}
