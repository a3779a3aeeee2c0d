use crate::atoms::{sym, AtomTable};
use crate::heap::Heap;
use crate::value::Value;

/// Print a value to a string.
pub fn print_val(val: Value, heap: &Heap, atoms: &AtomTable) -> String {
    let mut out = String::new();
    print_inner(val, heap, atoms, &mut out, 0);
    out
}

fn print_inner(val: Value, heap: &Heap, atoms: &AtomTable, out: &mut String, depth: usize) {
    if depth > 1000 {
        out.push_str("...");
        return;
    }

    match val {
        Value::Nil => out.push_str("nil"),
        Value::Atom(id) => out.push_str(atoms.name(id)),
        Value::Builtin(b) => {
            out.push_str("#<builtin ");
            out.push_str(b.name());
            out.push('>');
        }
        Value::Pair(id) => {
            let car = heap.car(id);
            let cdr = heap.cdr(id);

            // (quote x) -> 'x
            if car == Value::Atom(sym::QUOTE) {
                if let Value::Pair(cdr_id) = cdr {
                    if heap.cdr(cdr_id).is_nil() {
                        out.push('\'');
                        print_inner(heap.car(cdr_id), heap, atoms, out, depth + 1);
                        return;
                    }
                }
            }

            out.push('(');
            print_inner(car, heap, atoms, out, depth + 1);

            let mut current = cdr;
            let mut printed = 0;
            loop {
                match current {
                    Value::Nil => break,
                    Value::Pair(pid) => {
                        printed += 1;
                        if printed > 10_000 {
                            out.push_str(" ...");
                            break;
                        }
                        out.push(' ');
                        print_inner(heap.car(pid), heap, atoms, out, depth + 1);
                        current = heap.cdr(pid);
                    }
                    _ => {
                        out.push_str(" . ");
                        print_inner(current, heap, atoms, out, depth + 1);
                        break;
                    }
                }
            }
            out.push(')');
        }
    }
}
