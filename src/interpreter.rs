//! Tree-walking evaluator.
//!
//! Walks the AST depth-first, executing statements for effect and
//! expressions for value.  Variable references resolved by the static pass
//! are looked up by walking an exact number of environment links; anything
//! without a recorded distance lives in (or is an error against) the global
//! frame.
//!
//! The `return` transfer is modeled as [`Flow::Return`] threaded through
//! statement results rather than as an error, so its unwind target (the
//! nearest function call boundary) is explicit in the types.  Runtime
//! errors are ordinary `Err`s and halt interpretation at the first one.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::class::{LoxClass, LoxInstance};
use crate::environment::{EnvRef, Environment};
use crate::error::{Diagnostics, LoxError, Result};
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::function::{LoxFunction, NativeFunction};
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// User-level call nesting beyond this is reported as stack exhaustion
/// instead of overflowing the host stack.
const MAX_CALL_DEPTH: usize = 1024;

/// Outcome of executing one statement: either fall through to the next, or
/// unwind to the nearest enclosing call boundary carrying a value.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    /// The global frame, also reachable as the tail of every chain.
    pub globals: EnvRef,

    /// The frame statements currently execute in.  Saved and restored with
    /// strict stack discipline around blocks and calls.
    environment: EnvRef,

    /// Resolution table: expression id → enclosing-scope distance.  Written
    /// once by the resolver, read-only here.  Absent ⇒ global.
    locals: HashMap<ExprId, usize>,

    /// Next free expression id for parsers feeding this session.  Ids must
    /// stay unique for the session's lifetime: closures declared on earlier
    /// REPL lines keep their table entries, so a later parse reusing an id
    /// would rebind them.
    ids: ExprId,

    /// Sink for `print` statement output.
    output: Box<dyn Write>,

    /// Current user-function call nesting.
    depth: usize,
}

impl Interpreter {
    /// Create an interpreter printing to stdout, with the native `clock`
    /// function seeded into the globals.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Create an interpreter printing to an arbitrary sink.  Tests use this
    /// to capture `print` output.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::Native(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: |_args: &[Value]| {
                    let seconds: f64 = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map_err(|e| format!("Clock error: {}", e))?
                        .as_secs_f64();

                    Ok(Value::Number(seconds))
                },
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            ids: 0,
            output,
            depth: 0,
        }
    }

    /// The session's expression-id counter, handed to each
    /// [`crate::parser::Parser`] so that successive parses draw from one
    /// id space.
    pub fn expr_ids(&mut self) -> &mut ExprId {
        &mut self.ids
    }

    /// Record a resolved scope distance for an expression node.  Called by
    /// the resolver; each node is recorded at most once.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        debug!("Resolved expr #{} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Read-only view of the resolution table, for tests and debugging.
    pub fn locals(&self) -> &HashMap<ExprId, usize> {
        &self.locals
    }

    /// Execute a program.  Reports at most one runtime failure to the
    /// collector and stops at it; no further statements execute.
    pub fn interpret(&mut self, statements: &[Stmt], diagnostics: &mut Diagnostics) {
        debug!("Interpreting {} statement(s)", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}

                Ok(Flow::Return(_)) => {
                    // The resolver rejects top-level `return`; reaching this
                    // is an interpreter bug, surfaced rather than ignored.
                    diagnostics.report(LoxError::Runtime {
                        message: "Internal error: 'return' escaped the top level.".to_string(),
                        line: 0,
                    });
                    return;
                }

                Err(error) => {
                    diagnostics.report(error);
                    return;
                }
            }
        }

        info!("Interpretation completed successfully");
    }

    // ───────────────────────── statements ─────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value)
                    .map_err(|e| LoxError::Runtime {
                        message: format!("Failed to write output: {}.", e),
                        line: 0,
                    })?;

                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let enclosing = Rc::clone(&self.environment);
                let scope = Rc::new(RefCell::new(Environment::with_enclosing(enclosing)));

                self.execute_block(statements, scope)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                // The loop variable lives in its own scope.
                let enclosing = Rc::clone(&self.environment);
                let scope = Rc::new(RefCell::new(Environment::with_enclosing(enclosing)));

                let previous = std::mem::replace(&mut self.environment, scope);
                let result = self.run_for(initializer.as_deref(), condition, increment, body);
                self.environment = previous;

                result
            }

            Stmt::Function(declaration) => {
                // The closure is the environment active at the declaration.
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Function(Rc::new(function)),
                );

                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    fn run_for(
        &mut self,
        initializer: Option<&Stmt>,
        condition: &Option<Expr>,
        increment: &Option<Expr>,
        body: &Stmt,
    ) -> Result<Flow> {
        if let Some(init) = initializer {
            self.execute(init)?;
        }

        loop {
            let keep_going = match condition {
                Some(cond) => self.evaluate(cond)?.is_truthy(),
                None => true,
            };

            if !keep_going {
                return Ok(Flow::Normal);
            }

            if let Flow::Return(value) = self.execute(body)? {
                return Ok(Flow::Return(value));
            }

            if let Some(inc) = increment {
                self.evaluate(inc)?;
            }
        }
    }

    /// Execute `statements` inside `scope`, restoring the previous
    /// environment on every exit path, including errors and returns.
    pub fn execute_block(&mut self, statements: &[Stmt], scope: EnvRef) -> Result<Flow> {
        let previous = std::mem::replace(&mut self.environment, scope);

        let result = self.run_block(statements);

        self.environment = previous;
        result
    }

    fn run_block(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<crate::stmt::FunctionDecl>],
    ) -> Result<Flow> {
        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;

                match value {
                    Value::Class(class) => Some(class),
                    _ => {
                        let token = match expr {
                            Expr::Variable { name, .. } => name,
                            _ => name,
                        };

                        return Err(LoxError::runtime(token, "Superclass must be a class."));
                    }
                }
            }

            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Methods of a subclass close over a frame binding `super`, nested
        // between the declaration scope and each method's `this` frame.
        let method_closure: EnvRef = match &superclass_value {
            Some(class) => {
                let mut scope = Environment::with_enclosing(Rc::clone(&self.environment));
                scope.define("super", Value::Class(Rc::clone(class)));

                Rc::new(RefCell::new(scope))
            }

            None => Rc::clone(&self.environment),
        };

        let mut method_map = HashMap::new();

        for declaration in methods {
            let is_initializer = declaration.name.lexeme == "init";
            let function = LoxFunction::new(
                Rc::clone(declaration),
                Rc::clone(&method_closure),
                is_initializer,
            );

            method_map.insert(declaration.name.lexeme.clone(), Rc::new(function));
        }

        let class = LoxClass::new(name.lexeme.clone(), superclass_value, method_map);

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))?;

        info!("Class '{}' defined", name.lexeme);

        Ok(Flow::Normal)
    }

    // ───────────────────────── expressions ────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_value = self.evaluate(left)?;

                // Short-circuit, yielding an original operand value.
                let short_circuits = match operator.token_type {
                    TokenType::OR => left_value.is_truthy(),
                    _ => !left_value.is_truthy(),
                };

                if short_circuits {
                    Ok(left_value)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(
                            &self.environment,
                            distance,
                            &name.lexeme,
                            value.clone(),
                        );
                    }

                    None => {
                        self.globals.borrow_mut().assign(name, value.clone())?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_value = self.evaluate(callee)?;

                let mut argument_values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    argument_values.push(self.evaluate(argument)?);
                }

                self.call_value(callee_value, paren, argument_values)
            }

            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => LoxInstance::get(&instance, name),
                    _ => Err(LoxError::runtime(name, "Only instances have properties.")),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;
                        instance.borrow_mut().set(name, value.clone());

                        Ok(value)
                    }

                    _ => Err(LoxError::runtime(name, "Only instances have fields.")),
                }
            }

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right_value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_value {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!right_value.is_truthy())),

            _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left_value = self.evaluate(left)?;
        let right_value = self.evaluate(right)?;

        let as_numbers = |op: fn(f64, f64) -> Value| -> Result<Value> {
            match (&left_value, &right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(op(*a, *b)),
                _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
            }
        };

        match operator.token_type {
            TokenType::PLUS => match (&left_value, &right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                // If either side is a string, stringify the other and
                // concatenate.
                (Value::String(_), _) | (_, Value::String(_)) => {
                    Ok(Value::String(format!("{}{}", left_value, right_value)))
                }

                _ => Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => as_numbers(|a, b| Value::Number(a - b)),
            TokenType::STAR => as_numbers(|a, b| Value::Number(a * b)),
            // IEEE-754 semantics: x/0 is an infinity or NaN, not an error.
            TokenType::SLASH => as_numbers(|a, b| Value::Number(a / b)),

            TokenType::GREATER => as_numbers(|a, b| Value::Bool(a > b)),
            TokenType::GREATER_EQUAL => as_numbers(|a, b| Value::Bool(a >= b)),
            TokenType::LESS => as_numbers(|a, b| Value::Bool(a < b)),
            TokenType::LESS_EQUAL => as_numbers(|a, b| Value::Bool(a <= b)),

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_value == right_value)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left_value != right_value)),

            _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        // The resolver recorded where the `super` frame sits; `this` is
        // always bound one frame inside it.
        let distance = match self.locals.get(&id) {
            Some(&distance) => distance,
            None => return Err(LoxError::runtime(keyword, "Unresolved 'super'.")),
        };

        let superclass = match Environment::get_at(&self.environment, distance, "super") {
            Some(Value::Class(class)) => class,
            _ => return Err(LoxError::runtime(keyword, "Unresolved 'super'.")),
        };

        let instance = match Environment::get_at(&self.environment, distance - 1, "this") {
            Some(Value::Instance(instance)) => instance,
            _ => return Err(LoxError::runtime(keyword, "Unresolved 'this'.")),
        };

        // Lookup starts one level above the class the expression appears
        // in, not above the runtime instance's class.
        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),

            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme)
                .ok_or_else(|| {
                    LoxError::runtime(
                        name,
                        format!("Undefined variable '{}'.", name.lexeme),
                    )
                }),

            None => self.globals.borrow().get(name),
        }
    }

    // ───────────────────────── call dispatch ──────────────────────

    fn call_value(
        &mut self,
        callee: Value,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        match callee {
            Value::Function(function) => {
                self.check_arity(function.arity(), arguments.len(), paren)?;
                self.call_guarded(paren, |interp| function.call(interp, arguments))
            }

            Value::Native(native) => {
                self.check_arity(native.arity, arguments.len(), paren)?;

                (native.func)(&arguments)
                    .map_err(|message| LoxError::runtime(paren, message))
            }

            Value::Class(class) => {
                self.check_arity(class.arity(), arguments.len(), paren)?;

                let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(&class))));

                // The instantiation expression always yields the new
                // instance, whatever `init` returns.
                if let Some(initializer) = class.find_method("init") {
                    let bound = initializer.bind(Rc::clone(&instance));
                    self.call_guarded(paren, |interp| bound.call(interp, arguments))?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(LoxError::runtime(
                paren,
                "Can only call functions and classes.",
            )),
        }
    }

    fn check_arity(&self, expected: usize, got: usize, paren: &Token) -> Result<()> {
        if expected != got {
            return Err(LoxError::runtime(
                paren,
                format!("Expected {} arguments but got {}.", expected, got),
            ));
        }

        Ok(())
    }

    /// Run a user-function call with the depth counter maintained, so
    /// runaway recursion surfaces as a labeled error instead of blowing the
    /// host stack.
    fn call_guarded<F>(&mut self, paren: &Token, call: F) -> Result<Value>
    where
        F: FnOnce(&mut Interpreter) -> Result<Value>,
    {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        self.depth += 1;
        let result = call(self);
        self.depth -= 1;

        result
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
