//! Host shim for compiled Pinky modules.
//!
//! Instantiates a module under `wasmi` with an `env` import object exposing
//! `print` and `println`. Each host call receives a boxed-value pointer,
//! reads the tag byte at that pointer straight out of exported linear
//! memory and dispatches: nil → `"nil"`, bool → `"true"`/`"false"`,
//! number → decimal text, string → the referenced bytes. `println` appends
//! `"\n"`. Emitted strings are collected into an ordered list returned from
//! [`run`].

use thiserror::Error;

/// Boxed-value tags (mirrors pinky-codegen/src/types.rs).
const TAG_NIL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_NUMBER: u8 = 2;
const TAG_STRING: u8 = 3;

/// Errors from instantiating or executing a module.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The bytes did not instantiate as a valid module with the expected
    /// imports and exports.
    #[error("invalid module: {0}")]
    Instantiate(String),

    /// Execution trapped (including the compiled-in loop iteration cap).
    #[error("execution trapped: {0}")]
    Trap(String),
}

/// Host state held by the wasmi store: the ordered output list.
#[derive(Default)]
struct HostState {
    out: Vec<String>,
}

/// Instantiate `wasm` and call its exported `main`, returning every string
/// emitted through `env.print` / `env.println` in order.
pub fn run(wasm: &[u8]) -> Result<Vec<String>, RuntimeError> {
    let engine = wasmi::Engine::default();
    let module = wasmi::Module::new(&engine, wasm)
        .map_err(|e| RuntimeError::Instantiate(e.to_string()))?;

    let mut store = wasmi::Store::new(&engine, HostState::default());
    let mut linker = <wasmi::Linker<HostState>>::new(&engine);

    linker
        .func_wrap(
            "env",
            "print",
            |mut caller: wasmi::Caller<'_, HostState>, ptr: i32| {
                let text = read_boxed(&mut caller, ptr);
                caller.data_mut().out.push(text);
            },
        )
        .map_err(|e| RuntimeError::Instantiate(e.to_string()))?;

    linker
        .func_wrap(
            "env",
            "println",
            |mut caller: wasmi::Caller<'_, HostState>, ptr: i32| {
                let mut text = read_boxed(&mut caller, ptr);
                text.push('\n');
                caller.data_mut().out.push(text);
            },
        )
        .map_err(|e| RuntimeError::Instantiate(e.to_string()))?;

    let instance = linker
        .instantiate(&mut store, &module)
        .map_err(|e| RuntimeError::Instantiate(e.to_string()))?
        .start(&mut store)
        .map_err(|e| RuntimeError::Trap(e.to_string()))?;

    let main = instance
        .get_typed_func::<(), ()>(&store, "main")
        .map_err(|e| RuntimeError::Instantiate(e.to_string()))?;
    main.call(&mut store, ())
        .map_err(|e| RuntimeError::Trap(e.to_string()))?;

    Ok(store.into_data().out)
}

/// Read and render the boxed value at `ptr` from the instance's memory.
fn read_boxed(caller: &mut wasmi::Caller<'_, HostState>, ptr: i32) -> String {
    let memory = caller
        .get_export("memory")
        .and_then(|e| e.into_memory())
        .expect("module exports memory");
    let data = memory.data(&*caller);
    render_value(data, ptr as usize)
}

/// Decode one boxed value out of a linear-memory image.
fn render_value(data: &[u8], ptr: usize) -> String {
    match data.get(ptr).copied() {
        Some(TAG_NIL) => "nil".to_string(),
        Some(TAG_BOOL) => {
            if data.get(ptr + 1).copied().unwrap_or(0) != 0 {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        Some(TAG_NUMBER) => {
            let bytes: [u8; 8] = data[ptr + 1..ptr + 9]
                .try_into()
                .expect("number payload in bounds");
            format_number(f64::from_le_bytes(bytes))
        }
        Some(TAG_STRING) => {
            let offset = u32::from_le_bytes(
                data[ptr + 1..ptr + 5].try_into().expect("offset in bounds"),
            ) as usize;
            let len = u32::from_le_bytes(
                data[ptr + 5..ptr + 9].try_into().expect("length in bounds"),
            ) as usize;
            String::from_utf8_lossy(&data[offset..offset + len]).to_string()
        }
        other => format!("<bad tag {other:?} at {ptr}>"),
    }
}

/// Render a number: integral values print without a fractional part.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.2e18 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
