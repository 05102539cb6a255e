//! Builders and small sample programs shared by unit tests.

use crate::classpath::ClassPath;
use crate::ir::{Class, Instruction, InvokeExpr, Method, MethodAccess};
use crate::types::{ClassType, MethodSignature, OBJECT};

pub(crate) fn sig(text: &str) -> MethodSignature {
    text.parse().expect("method signature")
}

pub(crate) fn class(name: &str, super_class: Option<&str>, methods: Vec<Method>) -> Class {
    Class {
        name: ClassType::new(name),
        super_class: super_class.map(ClassType::new),
        interfaces: Vec::new(),
        is_interface: false,
        is_abstract: false,
        methods,
    }
}

pub(crate) fn interface(name: &str, extends: &[&str], methods: Vec<Method>) -> Class {
    Class {
        interfaces: extends.iter().copied().map(ClassType::new).collect(),
        is_interface: true,
        ..class(name, None, methods)
    }
}

pub(crate) fn object_class() -> Class {
    class(
        OBJECT,
        None,
        vec![method("<java.lang.Object: void <init>()>", vec![])],
    )
}

impl Class {
    pub(crate) fn implementing(mut self, interfaces: &[&str]) -> Self {
        self.interfaces
            .extend(interfaces.iter().copied().map(ClassType::new));
        self
    }

    pub(crate) fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}

pub(crate) fn method(signature: &str, body: Vec<Instruction>) -> Method {
    Method {
        signature: sig(signature),
        access: MethodAccess {
            is_public: true,
            ..MethodAccess::default()
        },
        body,
    }
}

pub(crate) fn static_method(signature: &str, body: Vec<Instruction>) -> Method {
    let mut method = method(signature, body);
    method.access.is_static = true;
    method
}

pub(crate) fn abstract_method(signature: &str) -> Method {
    let mut method = method(signature, Vec::new());
    method.access.is_abstract = true;
    method
}

pub(crate) fn main_method(class: &str, body: Vec<Instruction>) -> Method {
    static_method(&format!("<{class}: void main(java.lang.String[])>"), body)
}

pub(crate) fn new_object(class: &str) -> Instruction {
    Instruction::New(ClassType::new(class))
}

pub(crate) fn invoke_static(target: &str) -> Instruction {
    Instruction::Invoke(InvokeExpr::Static {
        target: sig(target),
    })
}

pub(crate) fn invoke_special(receiver: &str, target: &str) -> Instruction {
    Instruction::Invoke(InvokeExpr::Special {
        receiver: receiver.to_string(),
        target: sig(target),
    })
}

pub(crate) fn invoke_virtual(receiver: &str, target: &str) -> Instruction {
    Instruction::Invoke(InvokeExpr::Virtual {
        receiver: receiver.to_string(),
        target: sig(target),
    })
}

pub(crate) fn invoke_interface(receiver: &str, target: &str) -> Instruction {
    Instruction::Invoke(InvokeExpr::Interface {
        receiver: receiver.to_string(),
        target: sig(target),
    })
}

fn class_path(classes: Vec<Class>) -> ClassPath {
    ClassPath::new(classes).expect("class path")
}

/// `example1.A` to `example1.E` form a single inheritance chain, each class
/// overriding `print`. `main` allocates `B` and `C` and calls `A.print`.
pub(crate) fn misc_example1() -> ClassPath {
    class_path(example1_classes(vec![
        new_object("example1.B"),
        invoke_special("$r1", "<example1.B: void <init>()>"),
        new_object("example1.C"),
        invoke_special("$r2", "<example1.C: void <init>()>"),
        invoke_virtual("$r1", "<example1.A: void print(java.lang.Object)>"),
    ]))
}

/// [`misc_example1`] where `main` also allocates `E`.
pub(crate) fn misc_example1_cha() -> ClassPath {
    class_path(example1_classes(vec![
        new_object("example1.B"),
        invoke_special("$r1", "<example1.B: void <init>()>"),
        new_object("example1.C"),
        invoke_special("$r2", "<example1.C: void <init>()>"),
        new_object("example1.E"),
        invoke_special("$r3", "<example1.E: void <init>()>"),
        invoke_virtual("$r1", "<example1.A: void print(java.lang.Object)>"),
    ]))
}

fn example1_classes(main_body: Vec<Instruction>) -> Vec<Class> {
    let chain = [
        ("A", "java.lang.Object"),
        ("B", "example1.A"),
        ("C", "example1.B"),
        ("D", "example1.C"),
        ("E", "example1.D"),
    ];
    let mut classes = vec![
        object_class(),
        class(
            "example1.Example",
            Some(OBJECT),
            vec![main_method("example1.Example", main_body)],
        ),
    ];
    for (name, super_class) in chain {
        let constructor_body = if name == "E" {
            Vec::new()
        } else {
            vec![invoke_special(
                "r0",
                &format!("<{super_class}: void <init>()>"),
            )]
        };
        classes.push(class(
            &format!("example1.{name}"),
            Some(super_class),
            vec![
                method(
                    &format!("<example1.{name}: void <init>()>"),
                    constructor_body,
                ),
                method(
                    &format!("<example1.{name}: void print(java.lang.Object)>"),
                    vec![Instruction::Other],
                ),
            ],
        ));
    }
    classes
}

/// `A` with subclasses `B` and `C` in `package`, each defining `newTarget`.
fn new_target_classes(package: &str) -> Vec<Class> {
    ["A", "B", "C"]
        .into_iter()
        .map(|name| {
            let super_class = if name == "A" {
                OBJECT.to_string()
            } else {
                format!("{package}.A")
            };
            class(
                &format!("{package}.{name}"),
                Some(&super_class),
                vec![
                    method(
                        &format!("<{package}.{name}: void <init>()>"),
                        vec![invoke_special(
                            "r0",
                            &format!("<{super_class}: void <init>()>"),
                        )],
                    ),
                    method(&format!("<{package}.{name}: int newTarget()>"), vec![]),
                ],
            )
        })
        .collect()
}

/// A virtual call site is processed before `C` is first allocated.
pub(crate) fn revisit() -> ClassPath {
    let driver = class(
        "revisit.RevisitedMethod",
        Some(OBJECT),
        vec![
            main_method(
                "revisit.RevisitedMethod",
                vec![
                    new_object("revisit.A"),
                    invoke_special("$r0", "<revisit.A: void <init>()>"),
                    invoke_static(
                        "<revisit.RevisitedMethod: void alreadyVisitedMethod(revisit.A)>",
                    ),
                    new_object("revisit.B"),
                    invoke_special("$r1", "<revisit.B: void <init>()>"),
                    invoke_static(
                        "<revisit.RevisitedMethod: void alreadyVisitedMethod(revisit.A)>",
                    ),
                    invoke_static("<revisit.RevisitedMethod: void newTypes()>"),
                ],
            ),
            static_method(
                "<revisit.RevisitedMethod: void alreadyVisitedMethod(revisit.A)>",
                vec![invoke_virtual("r0", "<revisit.A: int newTarget()>")],
            ),
            static_method(
                "<revisit.RevisitedMethod: void newTypes()>",
                vec![
                    new_object("revisit.C"),
                    invoke_special("$r0", "<revisit.C: void <init>()>"),
                ],
            ),
        ],
    );

    let mut classes = vec![object_class(), driver];
    classes.extend(new_target_classes("revisit"));
    class_path(classes)
}

/// `B` and `C` are only allocated through calls made by a recursive method
/// after its virtual call site was resolved.
pub(crate) fn recursive_revisit() -> ClassPath {
    let recursive =
        "<revisitrecur.RecursiveRevisitedMethod: void recursiveAlreadyVisitedMethod(revisitrecur.A)>";
    let driver = class(
        "revisitrecur.RecursiveRevisitedMethod",
        Some(OBJECT),
        vec![
            main_method(
                "revisitrecur.RecursiveRevisitedMethod",
                vec![
                    new_object("revisitrecur.A"),
                    invoke_special("$r0", "<revisitrecur.A: void <init>()>"),
                    invoke_static(recursive),
                ],
            ),
            static_method(
                recursive,
                vec![
                    invoke_virtual("r0", "<revisitrecur.A: int newTarget()>"),
                    invoke_static("<revisitrecur.RecursiveRevisitedMethod: void createB()>"),
                    invoke_static(recursive),
                ],
            ),
            static_method(
                "<revisitrecur.RecursiveRevisitedMethod: void createB()>",
                vec![
                    new_object("revisitrecur.B"),
                    invoke_special("$r0", "<revisitrecur.B: void <init>()>"),
                    invoke_static("<revisitrecur.RecursiveRevisitedMethod: void createC()>"),
                ],
            ),
            static_method(
                "<revisitrecur.RecursiveRevisitedMethod: void createC()>",
                vec![
                    new_object("revisitrecur.C"),
                    invoke_special("$r0", "<revisitrecur.C: void <init>()>"),
                ],
            ),
        ],
    );

    let mut classes = vec![object_class(), driver];
    classes.extend(new_target_classes("revisitrecur"));
    class_path(classes)
}

/// `dispatch.A` extends `dispatch.B`; `A` overrides `method` and inherits `method2`.
pub(crate) fn concrete_dispatch_program() -> ClassPath {
    class_path(vec![
        object_class(),
        class(
            "dispatch.B",
            Some(OBJECT),
            vec![
                method("<dispatch.B: void method()>", vec![]),
                method("<dispatch.B: void method2()>", vec![]),
            ],
        ),
        class(
            "dispatch.A",
            Some("dispatch.B"),
            vec![method("<dispatch.A: void method()>", vec![])],
        ),
    ])
}

/// Only `LaserPrinter` is allocated; it inherits `show` from `Printer`.
pub(crate) fn inherited_implementation() -> ClassPath {
    class_path(vec![
        object_class(),
        interface(
            "inherit.Display",
            &[],
            vec![abstract_method("<inherit.Display: void show()>")],
        ),
        class(
            "inherit.Printer",
            Some(OBJECT),
            vec![
                method(
                    "<inherit.Printer: void <init>()>",
                    vec![invoke_special("r0", "<java.lang.Object: void <init>()>")],
                ),
                method("<inherit.Printer: void show()>", vec![]),
            ],
        )
        .implementing(&["inherit.Display"]),
        class(
            "inherit.LaserPrinter",
            Some("inherit.Printer"),
            vec![method(
                "<inherit.LaserPrinter: void <init>()>",
                vec![invoke_special("r0", "<inherit.Printer: void <init>()>")],
            )],
        ),
        class(
            "inherit.Screen",
            Some(OBJECT),
            vec![method("<inherit.Screen: void show()>", vec![])],
        )
        .implementing(&["inherit.Display"]),
        class(
            "inherit.Main",
            Some(OBJECT),
            vec![main_method(
                "inherit.Main",
                vec![
                    new_object("inherit.LaserPrinter"),
                    invoke_special("$r0", "<inherit.LaserPrinter: void <init>()>"),
                    invoke_interface("$r0", "<inherit.Display: void show()>"),
                ],
            )],
        ),
    ])
}

/// `Sub.run` calls `super.run()`, which is abstract in `Base`.
pub(crate) fn abstract_super_call() -> ClassPath {
    class_path(vec![
        object_class(),
        class(
            "abstract_super.Base",
            Some(OBJECT),
            vec![
                method("<abstract_super.Base: void <init>()>", vec![]),
                abstract_method("<abstract_super.Base: void run()>"),
            ],
        )
        .abstract_class(),
        class(
            "abstract_super.Sub",
            Some("abstract_super.Base"),
            vec![
                method(
                    "<abstract_super.Sub: void <init>()>",
                    vec![invoke_special("r0", "<abstract_super.Base: void <init>()>")],
                ),
                method(
                    "<abstract_super.Sub: void run()>",
                    vec![invoke_special("r0", "<abstract_super.Base: void run()>")],
                ),
            ],
        ),
        class(
            "abstract_super.Main",
            Some(OBJECT),
            vec![main_method(
                "abstract_super.Main",
                vec![
                    new_object("abstract_super.Sub"),
                    invoke_special("$r0", "<abstract_super.Sub: void <init>()>"),
                    invoke_virtual("$r0", "<abstract_super.Sub: void run()>"),
                ],
            )],
        ),
    ])
}

/// `DogFactory` overrides `make` covariantly and keeps the bridge method
/// returning `Animal`. The virtual call in `call` is resolved before `alloc`
/// allocates `DogFactory` under FIFO order and after it under LIFO order.
pub(crate) fn bridge_method() -> ClassPath {
    class_path(vec![
        object_class(),
        class("bridge.Animal", Some(OBJECT), vec![]),
        class("bridge.Dog", Some("bridge.Animal"), vec![]),
        class(
            "bridge.Factory",
            Some(OBJECT),
            vec![method("<bridge.Factory: bridge.Animal make()>", vec![])],
        ),
        class(
            "bridge.DogFactory",
            Some("bridge.Factory"),
            vec![
                method("<bridge.DogFactory: bridge.Dog make()>", vec![]),
                method(
                    "<bridge.DogFactory: bridge.Animal make()>",
                    vec![invoke_virtual("r0", "<bridge.DogFactory: bridge.Dog make()>")],
                ),
            ],
        ),
        class(
            "bridge.Main",
            Some(OBJECT),
            vec![
                main_method(
                    "bridge.Main",
                    vec![
                        invoke_static("<bridge.Main: void call()>"),
                        invoke_static("<bridge.Main: void alloc()>"),
                    ],
                ),
                static_method(
                    "<bridge.Main: void call()>",
                    vec![invoke_virtual("$r0", "<bridge.Factory: bridge.Animal make()>")],
                ),
                static_method(
                    "<bridge.Main: void alloc()>",
                    vec![new_object("bridge.DogFactory")],
                ),
            ],
        ),
    ])
}
