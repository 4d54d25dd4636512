//! Runs a few in-process suites through the probe CLI.
//!
//! ```text
//! cargo run --example native_suite
//! cargo run --example native_suite -- -g math -v
//! cargo run --example native_suite -- --performance --max-samples 200
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use clap::Parser;
use probe::cli::{self, Cli};
use probe_core::PerfOverride;
use probe_guest::NativeLoader;

fn main() {
    cli::init_logging();

    let mut loader = NativeLoader::new();

    loader.register("demos/math.spec", |s| {
        s.describe("math", |s| {
            s.test("adds", |env| env.expect(1 + 1).to_be(2));
            s.test("is finite", |env| env.expect(1.0_f64 / 3.0).to_be_finite());
            s.throws("rejects division by zero", |env| {
                let divisor = 0;
                if divisor == 0 {
                    return env.fail("division by zero");
                }
                Ok(())
            });
            s.todo("handles overflow");
        });
    });

    loader.register("demos/hooks.spec", |s| {
        let seen = Rc::new(RefCell::new(Vec::new()));
        s.describe("outer", |s| {
            let outer = Rc::clone(&seen);
            s.before_each(move |_| {
                outer.borrow_mut().push(1);
                Ok(())
            });
            s.describe("inner", |s| {
                let inner = Rc::clone(&seen);
                s.before_each(move |_| {
                    inner.borrow_mut().push(2);
                    Ok(())
                });
                let observed = Rc::clone(&seen);
                s.test("sees ancestor hooks first", move |env| {
                    let order = observed.borrow().clone();
                    env.log(format!("{order:?}"))?;
                    env.expect(order == vec![1, 2]).to_be_truthy()
                });
            });
        });
    });

    loader.register("demos/sampling.spec", |s| {
        s.describe("sampling", |s| {
            s.test("sums a range", |env| {
                env.performance(PerfOverride::Enabled(true));
                env.performance(PerfOverride::MaxSamples(50));
                let total: u64 = (0..10_000).sum();
                env.expect(total as f64).to_be(49_995_000.0)
            });
        });
    });

    let mut args = Cli::parse();
    if args.files.is_empty() {
        args.files = loader.paths();
    }
    cli::run_with(args, &mut loader);
}
